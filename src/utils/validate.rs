use once_cell::sync::Lazy;
use regex::Regex;

static LOGIN_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid login id regex"));

// 系统生成的登录编号格式，管理员账号不得占用
static SEQUENTIAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(221|222|F|D)-\d{3}$").expect("Invalid sequential id regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$").expect("Invalid email regex")
});

/// 院系统一去空白并转大写，空串视为未设置
pub fn normalize_department(department: &str) -> Option<String> {
    let department = department.trim();
    (!department.is_empty()).then(|| department.to_uppercase())
}

/// 管理员账号的登录编号
pub fn validate_admin_login_id(login_id: &str) -> Result<(), &'static str> {
    if login_id.len() < 3 || login_id.len() > 32 {
        return Err("Login id length must be between 3 and 32 characters");
    }
    if !LOGIN_ID_RE.is_match(login_id) {
        return Err("Login id must contain only letters, numbers, underscores or hyphens");
    }
    if SEQUENTIAL_ID_RE.is_match(login_id) {
        return Err("Login id is reserved for generated student and staff ids");
    }
    Ok(())
}

pub fn validate_person_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > 100 {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    // 邮箱格式校验：必须包含 @ 和 .
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：8 字符
/// - 必须包含：大写字母 + 小写字母 + 数字
/// - 可选：特殊字符（增强安全性）
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    // 1. 长度检查：至少 8 个字符
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }

    // 2. 大写字母检查
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }

    // 3. 小写字母检查
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }

    // 4. 数字检查
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    // 5. 常见弱密码检查
    let weak_passwords = [
        "password",
        "12345678",
        "123456789",
        "qwerty123",
        "admin123",
        "password1",
        "Password1",
        "Qwerty123",
        "Abcd1234",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 简化的密码验证（返回 Result）
pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_login_id() {
        assert!(validate_admin_login_id("admin").is_ok());
        assert!(validate_admin_login_id("registrar_2").is_ok());
        assert!(validate_admin_login_id("ad").is_err());
        assert!(validate_admin_login_id("has space").is_err());
        assert!(validate_admin_login_id("F-001").is_err());
        assert!(validate_admin_login_id("221-042").is_err());
    }

    #[test]
    fn test_email_and_name() {
        assert!(validate_email("dean@college.edu").is_ok());
        assert!(validate_email("dean@college").is_err());
        assert!(validate_person_name("  ").is_err());
        assert!(validate_person_name("Reyes").is_ok());
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("MyP@ssw0rd").is_valid);
        assert!(validate_password("SecurePass123").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
    }

    #[test]
    fn test_no_uppercase() {
        let result = validate_password("abcd1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );
    }

    #[test]
    fn test_no_lowercase() {
        let result = validate_password("ABCD1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one lowercase letter")
        );
    }

    #[test]
    fn test_no_digit() {
        let result = validate_password("AbcdEfgh");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one digit")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }

    #[test]
    fn test_normalize_department() {
        assert_eq!(normalize_department(" ccs ").as_deref(), Some("CCS"));
        assert_eq!(normalize_department("CBA").as_deref(), Some("CBA"));
        assert_eq!(normalize_department("   "), None);
    }
}
