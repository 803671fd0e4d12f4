//! Single local account and login session.
//!
//! The device holds one user record under `@user` and the name of the
//! logged-in user under `@session`. Passwords are stored and compared in
//! plaintext; this is a local convenience gate, not a security boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::storage::{read_json, write_json, KeyValueStore, SESSION_KEY, USER_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Open login session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

pub fn validate_user_data(user: &User) -> Result<()> {
    if user.username.trim().is_empty() || user.password.is_empty() {
        return Err(Error::validation("INVALID_USER_DATA", "invalid user data"));
    }
    Ok(())
}

pub fn validate_login_credentials(username: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(Error::validation(
            "MISSING_CREDENTIALS",
            "username and password are required",
        ));
    }
    Ok(())
}

pub fn validate_password_change(current: &str, new: &str) -> Result<()> {
    if current.is_empty() || new.is_empty() {
        return Err(Error::validation(
            "INVALID_PASSWORD_CHANGE_PARAMS",
            "invalid parameters for password change",
        ));
    }
    if current == new {
        return Err(Error::validation(
            "SAME_PASSWORD",
            "new password must differ from the current one",
        ));
    }
    Ok(())
}

/// Persistence of the user record and the session
#[derive(Debug, Clone)]
pub struct UserStore<S> {
    store: S,
}

impl<S: KeyValueStore> UserStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The registered user, if any.
    pub fn load(&self) -> Result<Option<User>> {
        let Some(value) = read_json::<_, Value>(&self.store, USER_KEY)? else {
            return Ok(None);
        };
        let corrupted = || Error::CorruptData {
            key: USER_KEY.to_string(),
            code: "CORRUPTED_USER_DATA",
            message: "stored user record is missing username or password".to_string(),
        };
        let user: User = serde_json::from_value(value).map_err(|_| corrupted())?;
        if user.username.is_empty() || user.password.is_empty() {
            return Err(corrupted());
        }
        Ok(Some(user))
    }

    pub fn save(&self, user: &User) -> Result<()> {
        write_json(&self.store, USER_KEY, user)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove_item(USER_KEY)
    }

    pub fn load_session(&self) -> Result<Option<Session>> {
        read_json(&self.store, SESSION_KEY)
    }

    pub fn open_session(&self, username: &str) -> Result<Session> {
        let session = Session {
            username: username.to_string(),
            logged_in_at: Utc::now(),
        };
        write_json(&self.store, SESSION_KEY, &session)?;
        Ok(session)
    }

    pub fn close_session(&self) -> Result<()> {
        self.store.remove_item(SESSION_KEY)
    }
}

pub struct AuthService<S> {
    users: UserStore<S>,
}

impl<S: KeyValueStore> AuthService<S> {
    pub fn new(store: S) -> Self {
        Self {
            users: UserStore::new(store),
        }
    }

    pub fn users(&self) -> &UserStore<S> {
        &self.users
    }

    /// Store `user` as the device account and log it in. An existing
    /// account is replaced.
    pub fn register(&self, user: User) -> Result<User> {
        validate_user_data(&user)?;
        if let Some(previous) = self.users.load().ok().flatten() {
            if previous.username != user.username {
                tracing::warn!(previous = %previous.username, "replacing registered user");
            }
        }
        self.users.save(&user)?;
        self.users.open_session(&user.username)?;
        tracing::debug!(username = %user.username, "registered user");
        Ok(user)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        validate_login_credentials(username, password)?;
        let Some(stored) = self.users.load()? else {
            return Err(Error::authentication(
                "NO_USER_REGISTERED",
                "no user registered on this device",
            ));
        };
        if stored.username != username || stored.password != password {
            return Err(Error::authentication(
                "INVALID_CREDENTIALS",
                "incorrect username or password",
            ));
        }
        self.users.open_session(&stored.username)?;
        Ok(stored)
    }

    /// Close the session. The account stays registered.
    pub fn logout(&self) -> Result<()> {
        self.users.close_session()
    }

    /// User of the open session. A session naming a user that is no
    /// longer registered counts as logged out.
    pub fn current_user(&self) -> Result<Option<User>> {
        let Some(session) = self.users.load_session()? else {
            return Ok(None);
        };
        Ok(self
            .users
            .load()?
            .filter(|user| user.username == session.username))
    }

    pub fn require_user(&self) -> Result<User> {
        self.current_user()?.ok_or_else(|| {
            Error::authentication("NOT_LOGGED_IN", "not logged in; run `agenda login` first")
        })
    }

    pub fn update_password(&self, current: &str, new: &str) -> Result<User> {
        let user = self.require_user()?;
        validate_password_change(current, new)?;
        if user.password != current {
            return Err(Error::authentication(
                "INCORRECT_CURRENT_PASSWORD",
                "current password is incorrect",
            ));
        }
        let updated = User {
            password: new.to_string(),
            ..user
        };
        self.users.save(&updated)?;
        Ok(updated)
    }
}
