use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Utc};
use rand_core::OsRng;
use serde::Serialize;
use uuid::Uuid;

use super::{DomainError, DomainResult, clean_optional, matches_keyword};

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 32;
const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Clone, Debug)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Account as exposed over the API; never carries the password hash.
#[derive(Clone, Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&UserAccount> for AccountView {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            is_admin: account.is_admin,
            disabled: account.disabled,
            created_at: account.created_at,
            last_login_at: account.last_login_at,
        }
    }
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub display_name: Option<&'a str>,
    pub password: &'a str,
    pub is_admin: bool,
}

#[derive(Default)]
pub struct AccountDirectory {
    accounts: Vec<UserAccount>,
}

impl AccountDirectory {
    pub fn create(
        &mut self,
        input: NewAccount<'_>,
        now: DateTime<Utc>,
    ) -> DomainResult<AccountView> {
        let username = input.username.trim();
        validate_username(username)?;

        if self.find_by_username(username).is_some() {
            return Err(DomainError::Conflict("用户名已存在。".to_string()));
        }

        let password_hash = hash_checked_password(input.password)?;
        let display_name =
            clean_optional(input.display_name).unwrap_or_else(|| username.to_string());

        let account = UserAccount {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name,
            password_hash,
            is_admin: input.is_admin,
            disabled: false,
            created_at: now,
            last_login_at: None,
        };
        let view = AccountView::from(&account);
        self.accounts.push(account);
        Ok(view)
    }

    pub fn list(&self, keyword: Option<&str>) -> Vec<AccountView> {
        let mut accounts: Vec<&UserAccount> = self
            .accounts
            .iter()
            .filter(|account| {
                keyword.is_none_or(|keyword| {
                    matches_keyword(keyword, &[&account.username, &account.display_name])
                })
            })
            .collect();
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        accounts.into_iter().map(AccountView::from).collect()
    }

    pub fn get(&self, id: Uuid) -> Option<&UserAccount> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&UserAccount> {
        let username = username.trim();
        self.accounts
            .iter()
            .find(|account| account.username.eq_ignore_ascii_case(username))
    }

    fn find_by_username_mut(&mut self, username: &str) -> Option<&mut UserAccount> {
        let username = username.trim();
        self.accounts
            .iter_mut()
            .find(|account| account.username.eq_ignore_ascii_case(username))
    }

    pub fn authenticate(
        &mut self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<AccountView> {
        let invalid = || DomainError::Unauthorized("用户名或密码错误。".to_string());

        let account = self.find_by_username_mut(username).ok_or_else(invalid)?;
        if !verify_password(password, &account.password_hash) {
            return Err(invalid());
        }
        if account.disabled {
            return Err(DomainError::Forbidden("该账号已被停用。".to_string()));
        }

        account.last_login_at = Some(now);
        Ok(AccountView::from(&*account))
    }

    pub fn reset_password(&mut self, username: &str, password: &str) -> DomainResult<()> {
        let password_hash = hash_checked_password(password)?;
        let account = self
            .find_by_username_mut(username)
            .ok_or(DomainError::NotFound("未找到该用户。"))?;
        account.password_hash = password_hash;
        Ok(())
    }

    /// Enables or disables an account, returning its id so sessions can be revoked.
    pub fn set_disabled(
        &mut self,
        actor: Uuid,
        username: &str,
        disabled: bool,
    ) -> DomainResult<Uuid> {
        let target = self
            .find_by_username(username)
            .ok_or(DomainError::NotFound("未找到该用户。"))?;

        if target.id == actor && disabled {
            return Err(DomainError::Forbidden("不能停用当前登录的账号。".to_string()));
        }
        if disabled && target.is_admin && !target.disabled && self.enabled_admins() <= 1 {
            return Err(DomainError::Forbidden("至少需要保留一个可用的管理员。".to_string()));
        }

        let id = target.id;
        if let Some(account) = self.accounts.iter_mut().find(|account| account.id == id) {
            account.disabled = disabled;
        }
        Ok(id)
    }

    pub fn delete(&mut self, actor: Uuid, username: &str) -> DomainResult<Uuid> {
        let target = self
            .find_by_username(username)
            .ok_or(DomainError::NotFound("未找到该用户。"))?;

        if target.id == actor {
            return Err(DomainError::Forbidden("不能删除当前登录的账号。".to_string()));
        }
        if target.is_admin && !target.disabled && self.enabled_admins() <= 1 {
            return Err(DomainError::Forbidden("至少需要保留一个可用的管理员。".to_string()));
        }

        let id = target.id;
        self.accounts.retain(|account| account.id != id);
        Ok(id)
    }

    fn enabled_admins(&self) -> usize {
        self.accounts
            .iter()
            .filter(|account| account.is_admin && !account.disabled)
            .count()
    }
}

fn validate_username(username: &str) -> DomainResult<()> {
    if username.is_empty() {
        return Err(DomainError::invalid("请输入用户名。"));
    }
    let length = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&length) {
        return Err(DomainError::invalid(format!(
            "用户名长度需在 {USERNAME_MIN_CHARS}-{USERNAME_MAX_CHARS} 个字符之间。"
        )));
    }
    if !username
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(DomainError::invalid(
            "用户名只能包含字母、数字、下划线或连字符。",
        ));
    }
    Ok(())
}

/// Surrounding whitespace does not count toward the minimum length but is hashed as typed.
fn hash_checked_password(password: &str) -> DomainResult<String> {
    if password.trim().chars().count() < PASSWORD_MIN_CHARS {
        return Err(DomainError::invalid(format!(
            "密码至少需要 {PASSWORD_MIN_CHARS} 个字符。"
        )));
    }
    hash_password(password).map_err(|err| DomainError::Internal(format!("密码处理失败：{err}")))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory_with_admin() -> (AccountDirectory, Uuid) {
        let mut directory = AccountDirectory::default();
        let admin = directory
            .create(
                NewAccount {
                    username: "admin",
                    display_name: Some("系统管理员"),
                    password: "secret-pass",
                    is_admin: true,
                },
                Utc::now(),
            )
            .unwrap();
        (directory, admin.id)
    }

    #[test]
    fn create_validates_and_rejects_duplicates() {
        let (mut directory, _) = directory_with_admin();
        let now = Utc::now();

        let err = directory
            .create(
                NewAccount {
                    username: "ab",
                    display_name: None,
                    password: "long-enough",
                    is_admin: false,
                },
                now,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));

        let err = directory
            .create(
                NewAccount {
                    username: "operator",
                    display_name: None,
                    password: "123",
                    is_admin: false,
                },
                now,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));

        let err = directory
            .create(
                NewAccount {
                    username: "ADMIN",
                    display_name: None,
                    password: "long-enough",
                    is_admin: false,
                },
                now,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn authenticate_checks_password_and_disabled_flag() {
        let (mut directory, admin_id) = directory_with_admin();
        let now = Utc::now();
        directory
            .create(
                NewAccount {
                    username: "clerk",
                    display_name: None,
                    password: "clerk-pass",
                    is_admin: false,
                },
                now,
            )
            .unwrap();

        assert!(matches!(
            directory.authenticate("clerk", "wrong", now),
            Err(DomainError::Unauthorized(_))
        ));

        let view = directory.authenticate("clerk", "clerk-pass", now).unwrap();
        assert_eq!(view.display_name, "clerk");
        assert_eq!(view.last_login_at, Some(now));

        directory.set_disabled(admin_id, "clerk", true).unwrap();
        assert!(matches!(
            directory.authenticate("clerk", "clerk-pass", now),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn admins_cannot_remove_themselves_or_the_last_admin() {
        let (mut directory, admin_id) = directory_with_admin();

        assert!(matches!(
            directory.set_disabled(admin_id, "admin", true),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            directory.delete(admin_id, "admin"),
            Err(DomainError::Forbidden(_))
        ));

        let other = Uuid::new_v4();
        assert!(matches!(
            directory.delete(other, "admin"),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            directory.delete(admin_id, "ghost"),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn reset_password_replaces_hash() {
        let (mut directory, _) = directory_with_admin();
        directory.reset_password("admin", "another-pass").unwrap();
        assert!(directory.authenticate("admin", "secret-pass", Utc::now()).is_err());
        assert!(directory.authenticate("admin", "another-pass", Utc::now()).is_ok());
    }

    #[test]
    fn passwords_with_surrounding_spaces_log_in_as_typed() {
        let (mut directory, _) = directory_with_admin();
        let now = Utc::now();
        directory
            .create(
                NewAccount {
                    username: "spacey",
                    display_name: None,
                    password: " pass word ",
                    is_admin: false,
                },
                now,
            )
            .unwrap();

        assert!(directory.authenticate("spacey", " pass word ", now).is_ok());
        assert!(directory.authenticate("spacey", "pass word", now).is_err());

        directory.reset_password("spacey", "  padded-pass").unwrap();
        assert!(directory.authenticate("spacey", "  padded-pass", now).is_ok());
        assert!(matches!(
            directory.reset_password("spacey", "  abc   "),
            Err(DomainError::Invalid(_))
        ));
    }
}
