use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(SpyCatId);

/// A roster record as held by the server. `id` is always server-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpyCat {
    pub id: SpyCatId,
    pub name: String,
    pub breed: String,
    pub years_of_experience: u32,
    pub salary: f64,
}

/// Creation payload; carries no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpyCatCreate {
    pub name: String,
    pub breed: String,
    pub years_of_experience: u32,
    pub salary: f64,
}

/// Partial update payload. Salary is the only mutable field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpyCatUpdate {
    pub salary: f64,
}

impl SpyCat {
    pub fn matches_draft(&self, draft: &SpyCatCreate) -> bool {
        self.name == draft.name
            && self.breed == draft.breed
            && self.years_of_experience == draft.years_of_experience
            && self.salary == draft.salary
    }
}

pub fn total_salary(cats: &[SpyCat]) -> f64 {
    cats.iter().map(|cat| cat.salary).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: i64, salary: f64) -> SpyCat {
        SpyCat {
            id: SpyCatId(id),
            name: format!("cat-{id}"),
            breed: "Siamese".into(),
            years_of_experience: 2,
            salary,
        }
    }

    #[test]
    fn total_salary_sums_every_entity() {
        let cats = vec![cat(1, 1000.0), cat(2, 2000.0), cat(3, 3000.0)];
        assert_eq!(total_salary(&cats), 6000.0);
        assert_eq!(total_salary(&[]), 0.0);
    }

    #[test]
    fn id_serializes_as_bare_integer() {
        let json = serde_json::to_value(cat(42, 10.5)).expect("json");
        assert_eq!(json["id"], serde_json::json!(42));
        assert_eq!(json["salary"], serde_json::json!(10.5));
    }

    #[test]
    fn create_payload_has_no_id_field() {
        let draft = SpyCatCreate {
            name: "Tom".into(),
            breed: "Persian".into(),
            years_of_experience: 3,
            salary: 1200.0,
        };
        let json = serde_json::to_value(&draft).expect("json");
        assert!(json.get("id").is_none());
        assert_eq!(json["years_of_experience"], serde_json::json!(3));
    }
}
