//! `cumeets completions <shell>`

use std::io::{self, Write};

use clap::CommandFactory as _;
use clap_complete::Shell;

use crate::cli::Cli;

pub fn generate_completions(shell: Shell) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write_completions(shell, &mut stdout)?;
    stdout.flush()
}

pub fn write_completions(shell: Shell, out: &mut dyn Write) -> io::Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_owned();
    clap_complete::generate(shell, &mut cmd, bin_name, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_mentions_list_subcommand() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut buf).expect("write to vec");
        let script = String::from_utf8(buf).expect("utf-8 script");

        assert!(script.contains("cumeets"));
        assert!(script.contains("list"));
    }
}
