use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    sqlx::FromRow,
    uuid::Uuid,
};

use crate::{db::Store, error::StoreError};

// ── Models ───────────────────────────────────────────────────────────────────

/// Embedded address document. At most one address per user carries
/// `is_default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub house: String,
    pub city: String,
    pub zip: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub role: String,
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: String,
    /// Address captured at registration, stored as the default.
    pub address: Option<NewAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    #[serde(default)]
    pub label: String,
    pub house: String,
    pub city: String,
    pub zip: String,
    #[serde(default, rename = "isDefault")]
    pub is_default: bool,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    phone: String,
    role: String,
    addresses: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            role: row.role,
            addresses: serde_json::from_str(&row.addresses)?,
            created_at: row.created_at,
        })
    }
}

// ── Queries ──────────────────────────────────────────────────────────────────

impl Store {
    pub async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let addresses: Vec<Address> = new
            .address
            .map(|a| {
                vec![Address {
                    id: Uuid::new_v4().to_string(),
                    label: if a.label.is_empty() { "home".into() } else { a.label },
                    house: a.house,
                    city: a.city,
                    zip: a.zip,
                    is_default: true,
                }]
            })
            .unwrap_or_default();
        let addresses_json = serde_json::to_string(&addresses)?;

        let res = sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, phone, role, addresses, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.phone)
        .bind(&new.role)
        .bind(&addresses_json)
        .bind(created_at)
        .execute(self.pool())
        .await;

        match res {
            Ok(_) => Ok(User {
                id,
                first_name: new.first_name,
                last_name: new.last_name,
                email: new.email,
                password_hash: new.password_hash,
                phone: new.phone,
                role: new.role,
                addresses,
                created_at,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateEmail)
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(User::try_from).transpose()
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;
        row.map(User::try_from).transpose()
    }

    pub async fn update_profile(&self, id: &str, patch: ProfilePatch) -> Result<User, StoreError> {
        let mut user = self.user_by_id(id).await?.ok_or(StoreError::NotFound)?;
        if let Some(first) = patch.first_name {
            user.first_name = first;
        }
        if let Some(last) = patch.last_name {
            user.last_name = last;
        }
        if let Some(phone) = patch.phone {
            user.phone = phone;
        }

        sqlx::query("UPDATE users SET first_name = ?, last_name = ?, phone = ? WHERE id = ?")
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(user)
    }

    pub async fn set_password(&self, email: &str, password_hash: &str) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ?")
            .bind(password_hash)
            .bind(email)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Append an address document. A new default clears the flag on every
    /// other address.
    pub async fn add_address(&self, user_id: &str, new: NewAddress) -> Result<User, StoreError> {
        self.mutate_addresses(user_id, |addresses| {
            if new.is_default {
                for a in addresses.iter_mut() {
                    a.is_default = false;
                }
            }
            addresses.push(Address {
                id: Uuid::new_v4().to_string(),
                label: new.label.clone(),
                house: new.house.clone(),
                city: new.city.clone(),
                zip: new.zip.clone(),
                is_default: new.is_default,
            });
            Ok(())
        })
        .await
    }

    pub async fn update_address(
        &self,
        user_id: &str,
        address_id: &str,
        new: NewAddress,
    ) -> Result<User, StoreError> {
        self.mutate_addresses(user_id, |addresses| {
            if !addresses.iter().any(|a| a.id == address_id) {
                return Err(StoreError::NotFound);
            }
            if new.is_default {
                for a in addresses.iter_mut() {
                    a.is_default = false;
                }
            }
            for a in addresses.iter_mut() {
                if a.id == address_id {
                    a.label = new.label.clone();
                    a.house = new.house.clone();
                    a.city = new.city.clone();
                    a.zip = new.zip.clone();
                    a.is_default = new.is_default;
                }
            }
            Ok(())
        })
        .await
    }

    pub async fn remove_address(
        &self,
        user_id: &str,
        address_id: &str,
    ) -> Result<User, StoreError> {
        self.mutate_addresses(user_id, |addresses| {
            let before = addresses.len();
            addresses.retain(|a| a.id != address_id);
            if addresses.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn mutate_addresses(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut Vec<Address>) -> Result<(), StoreError>,
    ) -> Result<User, StoreError> {
        let mut user = self.user_by_id(user_id).await?.ok_or(StoreError::NotFound)?;
        f(&mut user.addresses)?;
        let addresses_json = serde_json::to_string(&user.addresses)?;
        sqlx::query("UPDATE users SET addresses = ? WHERE id = ?")
            .bind(&addresses_json)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password_hash: "hash".into(),
            phone: "555-0100".into(),
            role: "user".into(),
            address: Some(NewAddress {
                label: String::new(),
                house: "12 Main St".into(),
                city: "Springfield".into(),
                zip: "12345".into(),
                is_default: false,
            }),
        }
    }

    #[tokio::test]
    async fn create_and_fetch_user() {
        let store = Store::in_memory().await.unwrap();
        let created = store.create_user(new_user("ada@example.com")).await.unwrap();
        let fetched = store.user_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.addresses.len(), 1);
        assert!(fetched.addresses[0].is_default);
        assert_eq!(fetched.addresses[0].label, "home");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = Store::in_memory().await.unwrap();
        store.create_user(new_user("ada@example.com")).await.unwrap();
        let err = store.create_user(new_user("ada@example.com")).await;
        assert!(matches!(err, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn profile_patch_is_partial() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(new_user("ada@example.com")).await.unwrap();
        let updated = store
            .update_profile(&user.id, ProfilePatch {
                phone: Some("555-0199".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.phone, "555-0199");
        assert_eq!(updated.first_name, "Ada");
    }

    #[tokio::test]
    async fn new_default_address_clears_previous() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(new_user("ada@example.com")).await.unwrap();
        let updated = store
            .add_address(&user.id, NewAddress {
                label: "work".into(),
                house: "1 Office Park".into(),
                city: "Springfield".into(),
                zip: "12346".into(),
                is_default: true,
            })
            .await
            .unwrap();
        let defaults: Vec<_> = updated.addresses.iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].label, "work");
    }

    #[tokio::test]
    async fn promoting_an_address_to_default_demotes_the_rest() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(new_user("ada@example.com")).await.unwrap();
        // Registration address is the default; add a non-default second one.
        let user = store
            .add_address(&user.id, NewAddress {
                label: "work".into(),
                house: "1 Office Park".into(),
                city: "Springfield".into(),
                zip: "12346".into(),
                is_default: false,
            })
            .await
            .unwrap();
        assert!(user.addresses.iter().find(|a| a.label == "home").unwrap().is_default);

        let work_id = user
            .addresses
            .iter()
            .find(|a| a.label == "work")
            .unwrap()
            .id
            .clone();
        let updated = store
            .update_address(&user.id, &work_id, NewAddress {
                label: "work".into(),
                house: "2 Office Park".into(),
                city: "Springfield".into(),
                zip: "12346".into(),
                is_default: true,
            })
            .await
            .unwrap();

        let defaults: Vec<_> = updated.addresses.iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].label, "work");
        assert_eq!(defaults[0].house, "2 Office Park");
    }

    #[tokio::test]
    async fn update_missing_address_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(new_user("ada@example.com")).await.unwrap();
        let err = store
            .update_address(&user.id, "nope", NewAddress {
                label: "work".into(),
                house: "1 Office Park".into(),
                city: "Springfield".into(),
                zip: "12346".into(),
                is_default: false,
            })
            .await;
        assert!(matches!(err, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn remove_missing_address_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(new_user("ada@example.com")).await.unwrap();
        let err = store.remove_address(&user.id, "nope").await;
        assert!(matches!(err, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn set_password_requires_existing_email() {
        let store = Store::in_memory().await.unwrap();
        assert!(matches!(
            store.set_password("ghost@example.com", "h").await,
            Err(StoreError::NotFound)
        ));
    }
}
