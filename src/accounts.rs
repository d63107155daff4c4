//! User and address book CRUD. These are collaborators around the ordering
//! core: thin create/read/update glue with the same error taxonomy.

use chrono::Utc;
use tracing::info;

use crate::error::OrderError;
use crate::models::{Address, AddressPatch, NewAddress, NewUser, User, UserPatch, UserRole};
use crate::store::{Store, StoreTxn};

pub struct Accounts<S: Store> {
    store: S,
}

impl<S: Store> Accounts<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a user. Email is normalized to lowercase and must be unique;
    /// new users start as customers.
    pub async fn create_user(&self, mut new: NewUser) -> Result<User, OrderError> {
        validate_email(&new.email)?;
        validate_phone(&new.phone_no)?;
        new.email = new.email.to_lowercase();

        let mut txn = self.store.begin().await?;
        if txn.user_by_email(&new.email).await?.is_some() {
            return Err(OrderError::Duplicate(format!(
                "User with email '{}' already exists.",
                new.email
            )));
        }
        let user = txn.insert_user(&new, UserRole::Customer, Utc::now()).await?;
        txn.commit().await?;

        info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i32) -> Result<User, OrderError> {
        let mut txn = self.store.begin().await?;
        txn.user_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)
    }

    pub async fn update_user(&self, user_id: i32, patch: UserPatch) -> Result<User, OrderError> {
        if let Some(phone_no) = &patch.phone_no {
            validate_phone(phone_no)?;
        }

        let mut txn = self.store.begin().await?;
        let mut user = txn
            .user_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;

        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        if let Some(middle_name) = patch.middle_name {
            user.middle_name = Some(middle_name);
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(phone_no) = patch.phone_no {
            user.phone_no = phone_no;
        }
        user.updated_at = Some(Utc::now());

        txn.update_user(user.clone()).await?;
        txn.commit().await?;
        Ok(user)
    }

    pub async fn set_role(&self, user_id: i32, role: UserRole) -> Result<User, OrderError> {
        let mut txn = self.store.begin().await?;
        let mut user = txn
            .user_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;
        user.role = role;
        user.updated_at = Some(Utc::now());
        txn.update_user(user.clone()).await?;
        txn.commit().await?;
        Ok(user)
    }

    /// Add an address for a user. A new default displaces the previous one
    /// inside the same transaction, so a user never holds two defaults.
    pub async fn create_address(
        &self,
        user_id: i32,
        new: NewAddress,
    ) -> Result<Address, OrderError> {
        let mut txn = self.store.begin().await?;
        txn.user_by_id(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;

        if new.is_default {
            if let Some(mut previous) = txn.default_address(user_id).await? {
                previous.is_default = false;
                previous.updated_at = Some(Utc::now());
                txn.update_address(previous).await?;
            }
        }
        let address = txn.insert_address(user_id, &new, Utc::now()).await?;
        txn.commit().await?;
        Ok(address)
    }

    pub async fn update_address(
        &self,
        user_id: i32,
        address_id: i32,
        patch: AddressPatch,
    ) -> Result<Address, OrderError> {
        let mut txn = self.store.begin().await?;
        let mut address = txn
            .address_for_user(address_id, user_id)
            .await?
            .ok_or(OrderError::AddressNotFound)?;

        if patch.is_default == Some(true) {
            if let Some(mut previous) = txn.default_address(user_id).await? {
                if previous.id != address.id {
                    previous.is_default = false;
                    previous.updated_at = Some(Utc::now());
                    txn.update_address(previous).await?;
                }
            }
        }

        if let Some(country) = patch.country {
            address.country = country;
        }
        if let Some(state) = patch.state {
            address.state = state;
        }
        if let Some(city) = patch.city {
            address.city = city;
        }
        if let Some(pincode) = patch.pincode {
            address.pincode = pincode;
        }
        if let Some(street) = patch.street {
            address.street = street;
        }
        if let Some(is_default) = patch.is_default {
            address.is_default = is_default;
        }
        address.updated_at = Some(Utc::now());

        txn.update_address(address.clone()).await?;
        txn.commit().await?;
        Ok(address)
    }
}

fn validate_email(email: &str) -> Result<(), OrderError> {
    if !email.contains('@') || !email.contains('.') {
        return Err(OrderError::Validation(
            "Invalid email format. An email address must contain \"@\" and at least one \".\" \
             character."
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_phone(phone_no: &str) -> Result<(), OrderError> {
    if phone_no.len() != 10 || !phone_no.chars().all(|c| c.is_ascii_digit()) {
        return Err(OrderError::Validation(
            "Phone number must be exactly 10 digits.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn accounts() -> Accounts<MemoryStore> {
        Accounts::new(MemoryStore::new())
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Asha".to_string(),
            middle_name: None,
            last_name: Some("Rao".to_string()),
            email: email.to_string(),
            phone_no: "9876543210".to_string(),
        }
    }

    fn new_address(is_default: bool) -> NewAddress {
        NewAddress {
            country: "India".to_string(),
            state: "Karnataka".to_string(),
            city: "Bengaluru".to_string(),
            pincode: "560001".to_string(),
            street: "12 MG Road".to_string(),
            is_default,
        }
    }

    #[tokio::test]
    async fn email_is_normalized_and_unique() {
        let accounts = accounts();
        let user = accounts.create_user(new_user("Asha@Example.com")).await.unwrap();
        assert_eq!(user.email, "asha@example.com");

        let err = accounts.create_user(new_user("asha@example.com")).await.unwrap_err();
        assert!(matches!(err, OrderError::Duplicate(_)));
    }

    #[tokio::test]
    async fn malformed_email_and_phone_are_rejected() {
        let accounts = accounts();

        let mut bad_email = new_user("not-an-email");
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            accounts.create_user(bad_email).await.unwrap_err(),
            OrderError::Validation(_)
        ));

        let mut bad_phone = new_user("asha@example.com");
        bad_phone.phone_no = "12345".to_string();
        assert!(matches!(
            accounts.create_user(bad_phone).await.unwrap_err(),
            OrderError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn update_user_patches_only_given_fields() {
        let accounts = accounts();
        let user = accounts.create_user(new_user("asha@example.com")).await.unwrap();

        let updated = accounts
            .update_user(
                user.id,
                UserPatch {
                    first_name: Some("Aisha".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Aisha");
        assert_eq!(updated.last_name, Some("Rao".to_string()));
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn a_user_has_at_most_one_default_address() {
        let accounts = accounts();
        let user = accounts.create_user(new_user("asha@example.com")).await.unwrap();

        let first = accounts.create_address(user.id, new_address(true)).await.unwrap();
        let second = accounts.create_address(user.id, new_address(true)).await.unwrap();

        let first = accounts
            .update_address(user.id, first.id, AddressPatch::default())
            .await
            .unwrap();
        assert!(!first.is_default);
        assert!(second.is_default);
    }

    #[tokio::test]
    async fn address_updates_are_scoped_to_the_owner() {
        let accounts = accounts();
        let asha = accounts.create_user(new_user("asha@example.com")).await.unwrap();
        let ravi = accounts.create_user(new_user("ravi@example.com")).await.unwrap();

        let address = accounts.create_address(asha.id, new_address(false)).await.unwrap();
        let err = accounts
            .update_address(ravi.id, address.id, AddressPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::AddressNotFound));
    }

    #[tokio::test]
    async fn addresses_require_an_existing_user() {
        let accounts = accounts();
        let err = accounts.create_address(42, new_address(false)).await.unwrap_err();
        assert!(matches!(err, OrderError::UserNotFound));
    }
}
