use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{
    error::AppError,
    models::{Role, StoredUser},
};

const USERS: TableDefinition<&str, &str> = TableDefinition::new("users");
const EMAILS: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");
const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("users_by_username");
const CASH_TAP_USERS: TableDefinition<&str, &str> = TableDefinition::new("users_by_cash_tap");

pub fn open_db(path: &str) -> Result<Database, AppError> {
    if Path::new(path).exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

pub fn init_db(db: &Database) -> Result<(), AppError> {
    let write_txn = db.begin_write()?;
    write_txn.open_table(USERS)?;
    write_txn.open_table(EMAILS)?;
    write_txn.open_table(USERNAMES)?;
    write_txn.open_table(CASH_TAP_USERS)?;
    write_txn.commit()?;
    Ok(())
}

pub fn insert_user(db: &Database, user: &StoredUser) -> Result<(), AppError> {
    let value = serde_json::to_string(user)?;
    let write_txn = db.begin_write()?;
    {
        let mut emails = write_txn.open_table(EMAILS)?;
        let mut usernames = write_txn.open_table(USERNAMES)?;
        let mut cash_taps = write_txn.open_table(CASH_TAP_USERS)?;

        if emails.get(user.email.as_str())?.is_some() {
            return Err(AppError::bad_request("Email already registered"));
        }
        if usernames.get(user.username.as_str())?.is_some() {
            return Err(AppError::bad_request("Username already registered"));
        }
        if cash_taps.get(user.cash_tap_user.as_str())?.is_some() {
            return Err(AppError::bad_request("CashTap user already registered"));
        }

        emails.insert(user.email.as_str(), user.id.as_str())?;
        usernames.insert(user.username.as_str(), user.id.as_str())?;
        cash_taps.insert(user.cash_tap_user.as_str(), user.id.as_str())?;

        let mut users = write_txn.open_table(USERS)?;
        users.insert(user.id.as_str(), value.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn get_user(db: &Database, id: &str) -> Result<Option<StoredUser>, AppError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(USERS)?;
    if let Some(value) = table.get(id)? {
        let user: StoredUser = serde_json::from_str(value.value())?;
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

pub fn find_by_login(db: &Database, login: &str) -> Result<Option<StoredUser>, AppError> {
    let id = {
        let read_txn = db.begin_read()?;
        let index = if login.contains('@') {
            read_txn.open_table(EMAILS)?
        } else {
            read_txn.open_table(USERNAMES)?
        };
        match index.get(login)? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        }
    };
    get_user(db, &id)
}

pub fn has_admin(db: &Database) -> Result<bool, AppError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(USERS)?;
    for entry in table.iter()? {
        let (_, value) = entry?;
        let user: StoredUser = serde_json::from_str(value.value())?;
        if user.role == Role::Admin {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.redb");
        let db = open_db(path.to_str().unwrap()).unwrap();
        init_db(&db).unwrap();
        (dir, db)
    }

    fn user(id: &str, username: &str, email: &str, cash_tap: &str, role: Role) -> StoredUser {
        StoredUser {
            id: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            cash_tap_user: cash_tap.to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_then_lookup_by_email_and_username() {
        let (_dir, db) = temp_db();
        insert_user(&db, &user("u1", "ghost", "ghost@x.io", "ghost_cash", Role::User)).unwrap();

        let by_email = find_by_login(&db, "ghost@x.io").unwrap().unwrap();
        assert_eq!(by_email.id, "u1");
        let by_name = find_by_login(&db, "ghost").unwrap().unwrap();
        assert_eq!(by_name.email, "ghost@x.io");
        assert!(find_by_login(&db, "nobody").unwrap().is_none());
        assert!(get_user(&db, "u1").unwrap().is_some());
    }

    #[test]
    fn duplicates_are_rejected_without_partial_writes() {
        let (_dir, db) = temp_db();
        insert_user(&db, &user("u1", "ghost", "ghost@x.io", "ghost_cash", Role::User)).unwrap();

        let err = insert_user(&db, &user("u2", "other", "ghost@x.io", "c2", Role::User)).unwrap_err();
        assert_eq!(err.message, "Email already registered");

        let err = insert_user(&db, &user("u3", "ghost", "new@x.io", "c3", Role::User)).unwrap_err();
        assert_eq!(err.message, "Username already registered");

        let err =
            insert_user(&db, &user("u4", "fresh", "fresh@x.io", "ghost_cash", Role::User)).unwrap_err();
        assert_eq!(err.message, "CashTap user already registered");

        assert!(get_user(&db, "u4").unwrap().is_none());
        assert!(find_by_login(&db, "fresh@x.io").unwrap().is_none());
    }

    #[test]
    fn has_admin_reflects_roles() {
        let (_dir, db) = temp_db();
        assert!(!has_admin(&db).unwrap());
        insert_user(&db, &user("u1", "ghost", "ghost@x.io", "g1", Role::User)).unwrap();
        assert!(!has_admin(&db).unwrap());
        insert_user(&db, &user("a1", "admin", "admin@x.io", "a1", Role::Admin)).unwrap();
        assert!(has_admin(&db).unwrap());
    }
}
