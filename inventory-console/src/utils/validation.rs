use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::ValidationError;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

const CEDULA_COEFFICIENTS: [u32; 9] = [2, 1, 2, 1, 2, 1, 2, 1, 2];
const MAX_PROVINCE: u32 = 24;

/// Outcome of a field check, carrying the message shown next to the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    fn ok(message: &str) -> Self {
        Self {
            valid: true,
            message: message.to_string(),
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            valid: false,
            message: message.to_string(),
        }
    }
}

/// Ecuadorian national ID: 10 digits, province 00-24, third digit 0-5 and a
/// modulo-10 check digit. Non-digit characters are stripped first.
pub fn validate_ecuadorian_id(cedula: &str) -> ValidationResult {
    let digits: Vec<u32> = cedula.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 10 {
        return ValidationResult::fail("La cédula debe tener 10 dígitos");
    }

    let province = digits[0] * 10 + digits[1];
    if province > MAX_PROVINCE {
        return ValidationResult::fail("Provincia inválida (00-24)");
    }
    if digits[2] > 5 {
        return ValidationResult::fail("El tercer dígito debe ser entre 0 y 5");
    }

    let sum: u32 = digits
        .iter()
        .zip(CEDULA_COEFFICIENTS.iter())
        .map(|(digit, coefficient)| {
            let product = digit * coefficient;
            if product >= 10 {
                product - 9
            } else {
                product
            }
        })
        .sum();
    let check_digit = (10 - sum % 10) % 10;
    if check_digit != digits[9] {
        return ValidationResult::fail("Décimo dígito verificador incorrecto");
    }

    ValidationResult::ok("Cédula válida")
}

pub fn validate_email(email: &str) -> ValidationResult {
    if EMAIL_PATTERN.is_match(email) {
        ValidationResult::ok("Correo válido")
    } else {
        ValidationResult::fail("Formato de correo inválido")
    }
}

/// Checks run in order; the first failing rule names the message.
pub fn validate_password_strength(password: &str) -> ValidationResult {
    if password.chars().count() < 8 {
        ValidationResult::fail("La contraseña debe tener al menos 8 caracteres")
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        ValidationResult::fail("Debe incluir mayúsculas")
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        ValidationResult::fail("Debe incluir minúsculas")
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        ValidationResult::fail("Debe incluir un número")
    } else if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        ValidationResult::fail("Debe incluir un carácter especial")
    } else {
        ValidationResult::ok("Contraseña fuerte")
    }
}

fn into_rule(code: &'static str, result: ValidationResult) -> Result<(), ValidationError> {
    if result.valid {
        Ok(())
    } else {
        let mut error = ValidationError::new(code);
        error.message = Some(result.message.into());
        Err(error)
    }
}

/// `validator` hook for cédula fields.
pub fn cedula_rule(value: &str) -> Result<(), ValidationError> {
    into_rule("cedula", validate_ecuadorian_id(value))
}

/// `validator` hook for password fields.
pub fn password_rule(value: &str) -> Result<(), ValidationError> {
    into_rule("password_strength", validate_password_strength(value))
}
