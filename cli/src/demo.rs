//! Sample directory used by `cumeets list --demo`.

use cumeets_business::config::DEFAULT_USERS_COLLECTION;
use cumeets_business::{Document, MemoryStore};
use serde_json::{Value, json};

fn person(id: &str, kind: &str, fields: &[(&str, Value)]) -> Document {
    fields.iter().fold(
        Document::new(id).with_field("type", json!(kind)),
        |doc, (key, value)| doc.with_field(*key, value.clone()),
    )
}

pub fn documents() -> Vec<Document> {
    vec![
        person(
            "a1",
            "Alumni",
            &[
                ("name", json!("Amy Lee")),
                ("work", json!("Software Engineer, Stripe")),
                ("graduation", json!(2019)),
                ("major", json!("Computer Science")),
            ],
        ),
        person(
            "a2",
            "Alumni",
            &[
                ("name", json!("Bo Park")),
                ("work", json!("Analyst, Federal Reserve")),
                ("graduation", json!("2016")),
                ("major", json!("Economics")),
            ],
        ),
        person(
            "a3",
            "Alumni",
            &[("name", json!("Dana Cruz")), ("major", json!("Mechanical Engineering"))],
        ),
        person(
            "s1",
            "Student",
            &[
                ("name", json!("Sam Ortiz")),
                ("graduation", json!(2027)),
                ("major", json!("Biology")),
            ],
        ),
        person(
            "s2",
            "Student",
            &[
                ("name", json!("Priya Shah")),
                ("work", json!("Research Assistant")),
                ("graduation", json!(2026)),
                ("major", json!("Computer Science")),
            ],
        ),
    ]
}

pub fn store() -> MemoryStore {
    MemoryStore::with_documents(DEFAULT_USERS_COLLECTION, documents())
}

#[cfg(test)]
mod tests {
    use cumeets_business::{Role, role_predicate};

    use super::*;

    #[test]
    fn both_roles_are_seeded() {
        let store = store();
        for role in Role::ALL {
            let docs = store.snapshot(DEFAULT_USERS_COLLECTION, &role_predicate(role));
            assert!(!docs.is_empty(), "no {role} in demo data");
        }
    }
}
