// src/auth/validators.rs

use super::models::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest};
use crate::common::{evaluate, FieldRules, Rule, ValidationResult, Validator};

pub const MIN_PASSWORD_LENGTH: usize = 6;
/// bcrypt ignores everything past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

const EMAIL_RULES: &[Rule] = &[Rule::Required, Rule::Email];
const PASSWORD_RULES: &[Rule] = &[
    Rule::Required,
    Rule::MinLen(MIN_PASSWORD_LENGTH),
    Rule::MaxBytes(MAX_PASSWORD_BYTES),
];
const NAME_RULES: &[Rule] = &[Rule::Required, Rule::MinLen(2), Rule::MaxLen(50)];
const PHONE_RULES: &[Rule] = &[Rule::OmitEmpty, Rule::MinLen(10), Rule::MaxLen(15)];
const REQUIRED: &[Rule] = &[Rule::Required];

pub struct AuthValidator;

impl Validator<RegisterRequest> for AuthValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        evaluate(&[
            FieldRules::new("email", Some(data.email.as_str()), EMAIL_RULES),
            FieldRules::new("password", Some(data.password.as_str()), PASSWORD_RULES),
            FieldRules::new("first_name", Some(data.first_name.as_str()), NAME_RULES),
            FieldRules::new("last_name", Some(data.last_name.as_str()), NAME_RULES),
            FieldRules::new("phone", data.phone.as_deref(), PHONE_RULES),
        ])
    }
}

impl Validator<LoginRequest> for AuthValidator {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        evaluate(&[
            FieldRules::new("email", Some(data.email.as_str()), EMAIL_RULES),
            FieldRules::new("password", Some(data.password.as_str()), REQUIRED),
        ])
    }
}

impl Validator<UpdateProfileRequest> for AuthValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        evaluate(&[
            FieldRules::new("first_name", Some(data.first_name.as_str()), NAME_RULES),
            FieldRules::new("last_name", Some(data.last_name.as_str()), NAME_RULES),
            FieldRules::new("phone", data.phone.as_deref(), PHONE_RULES),
        ])
    }
}

impl Validator<ChangePasswordRequest> for AuthValidator {
    fn validate(&self, data: &ChangePasswordRequest) -> ValidationResult {
        evaluate(&[
            FieldRules::new("current_password", Some(data.current_password.as_str()), REQUIRED),
            FieldRules::new("new_password", Some(data.new_password.as_str()), PASSWORD_RULES),
        ])
    }
}
