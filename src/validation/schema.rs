//! Request payloads for school create/update and their field rules.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::phone::is_valid_phone;
use super::sanitize::{self, lenient_f64, lenient_i32, Sanitize};
use crate::types::Role;

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid regex"));

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn valid_phone(value: &str) -> Result<(), ValidationError> {
    if is_valid_phone(Some(value)) {
        Ok(())
    } else {
        Err(error("phone", "must be 9 digits, +995 and 9 digits, or +995 XXX XX XX XX"))
    }
}

fn valid_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(error("email", "must be a valid email address"))
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("required", "is required"))
    } else {
        Ok(())
    }
}

fn valid_clock_time(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || CLOCK_TIME.is_match(value) {
        Ok(())
    } else {
        Err(error("time", "must be HH:MM"))
    }
}

/// Accepts `["a", "b"]` or the flattened `"a, b"` form older clients send.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(length(max = 255))]
    pub street: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
}

impl Sanitize for AddressPayload {
    fn sanitize(&mut self) {
        sanitize::text(&mut self.city);
        sanitize::text(&mut self.district);
        sanitize::text(&mut self.street);
        sanitize::text(&mut self.zip_code);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct InfrastructurePayload {
    pub has_library: bool,
    pub has_gym: bool,
    pub has_swimming_pool: bool,
    pub has_cafeteria: bool,
    pub has_medical_room: bool,
    pub has_playground: bool,
    pub has_computer_lab: bool,
    pub has_science_lab: bool,
    pub has_parking: bool,
    pub has_wheelchair_access: bool,
    #[serde(deserialize_with = "lenient_f64")]
    #[validate(range(min = 0.0))]
    pub building_area: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    #[validate(range(min = 0.0))]
    pub yard_area: Option<f64>,
    pub comment: Option<String>,
}

impl Sanitize for InfrastructurePayload {
    fn sanitize(&mut self) {
        sanitize::text(&mut self.comment);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationLevelPayload {
    #[serde(deserialize_with = "lenient_f64")]
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub discount_info: Option<String>,
    #[serde(deserialize_with = "lenient_i32")]
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
    #[serde(deserialize_with = "lenient_i32")]
    #[validate(range(min = 0))]
    pub students_per_class: Option<i32>,
    #[validate(custom(function = "valid_clock_time"))]
    pub starts_at: Option<String>,
    #[validate(custom(function = "valid_clock_time"))]
    pub ends_at: Option<String>,
    pub meals_included: bool,
    pub meals_comment: Option<String>,
    pub transport_available: bool,
    pub transport_comment: Option<String>,
    pub extended_day: bool,
    #[serde(deserialize_with = "string_list")]
    #[validate(length(max = 50))]
    pub sports_clubs: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    #[validate(length(max = 20))]
    pub foreign_languages: Vec<String>,
    pub extracurricular: Option<String>,
    pub admission_comment: Option<String>,
    /// Photo URLs attached to the level on create. Ignored on update.
    #[serde(deserialize_with = "string_list")]
    #[validate(length(max = 50))]
    pub photos: Vec<String>,
}

impl Sanitize for EducationLevelPayload {
    fn sanitize(&mut self) {
        sanitize::text(&mut self.discount_info);
        sanitize::text(&mut self.starts_at);
        sanitize::text(&mut self.ends_at);
        sanitize::text(&mut self.meals_comment);
        sanitize::text(&mut self.transport_comment);
        sanitize::text_list(&mut self.sports_clubs);
        sanitize::text_list(&mut self.foreign_languages);
        sanitize::text(&mut self.extracurricular);
        sanitize::text(&mut self.admission_comment);
        self.photos = self
            .photos
            .iter()
            .map(|p| sanitize::sanitize_url(p))
            .filter(|p| !p.is_empty())
            .collect();
    }
}

/// Body of `POST /api/schools`. Missing nested blocks are created empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SchoolPayload {
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub name: String,
    #[validate(custom(function = "valid_phone"))]
    pub phone_number1: Option<String>,
    #[validate(custom(function = "valid_phone"))]
    pub phone_number2: Option<String>,
    #[validate(custom(function = "valid_phone"))]
    pub phone_number3: Option<String>,
    #[validate(custom(function = "valid_email"))]
    pub email: Option<String>,
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub logo_url: Option<String>,
    #[validate(length(max = 200))]
    pub director_name: Option<String>,
    #[validate(length(max = 200))]
    pub deputy_director_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    #[validate(range(min = 1800, max = 2100))]
    pub founded_year: Option<i32>,
    pub description: Option<String>,
    pub history: Option<String>,
    pub mission: Option<String>,
    #[serde(default)]
    pub has_uniform: bool,
    pub uniform_comment: Option<String>,
    #[serde(default)]
    pub has_security: bool,
    pub security_comment: Option<String>,
    #[serde(default)]
    pub has_psychologist: bool,
    pub psychologist_comment: Option<String>,
    #[serde(default)]
    pub has_special_needs_support: bool,
    pub special_needs_comment: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub address: AddressPayload,
    #[serde(default)]
    #[validate(nested)]
    pub infrastructure: InfrastructurePayload,
    #[serde(default)]
    #[validate(nested)]
    pub primary_level: EducationLevelPayload,
    #[serde(default)]
    #[validate(nested)]
    pub basic_level: EducationLevelPayload,
    #[serde(default)]
    #[validate(nested)]
    pub secondary_level: EducationLevelPayload,
}

impl Sanitize for SchoolPayload {
    fn sanitize(&mut self) {
        self.name = sanitize::sanitize_string(&self.name);
        sanitize::phone(&mut self.phone_number1);
        sanitize::phone(&mut self.phone_number2);
        sanitize::phone(&mut self.phone_number3);
        sanitize::email(&mut self.email);
        sanitize::url(&mut self.website);
        sanitize::url(&mut self.facebook_url);
        sanitize::url(&mut self.instagram_url);
        sanitize::url(&mut self.logo_url);
        sanitize::text(&mut self.director_name);
        sanitize::text(&mut self.deputy_director_name);
        sanitize::text(&mut self.description);
        sanitize::text(&mut self.history);
        sanitize::text(&mut self.mission);
        sanitize::text(&mut self.uniform_comment);
        sanitize::text(&mut self.security_comment);
        sanitize::text(&mut self.psychologist_comment);
        sanitize::text(&mut self.special_needs_comment);
        self.address.sanitize();
        self.infrastructure.sanitize();
        self.primary_level.sanitize();
        self.basic_level.sanitize();
        self.secondary_level.sanitize();
    }
}

/// Body of `PUT /api/schools/:id`. Absent fields are left untouched; a present
/// nested block replaces the existing child row's columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SchoolUpdate {
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub name: Option<String>,
    #[validate(custom(function = "valid_phone"))]
    pub phone_number1: Option<String>,
    #[validate(custom(function = "valid_phone"))]
    pub phone_number2: Option<String>,
    #[validate(custom(function = "valid_phone"))]
    pub phone_number3: Option<String>,
    #[validate(custom(function = "valid_email"))]
    pub email: Option<String>,
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub logo_url: Option<String>,
    #[validate(length(max = 200))]
    pub director_name: Option<String>,
    #[validate(length(max = 200))]
    pub deputy_director_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    #[validate(range(min = 1800, max = 2100))]
    pub founded_year: Option<i32>,
    pub description: Option<String>,
    pub history: Option<String>,
    pub mission: Option<String>,
    pub has_uniform: Option<bool>,
    pub uniform_comment: Option<String>,
    pub has_security: Option<bool>,
    pub security_comment: Option<String>,
    pub has_psychologist: Option<bool>,
    pub psychologist_comment: Option<String>,
    pub has_special_needs_support: Option<bool>,
    pub special_needs_comment: Option<String>,
    #[validate(nested)]
    pub address: Option<AddressPayload>,
    #[validate(nested)]
    pub infrastructure: Option<InfrastructurePayload>,
    #[validate(nested)]
    pub primary_level: Option<EducationLevelPayload>,
    #[validate(nested)]
    pub basic_level: Option<EducationLevelPayload>,
    #[validate(nested)]
    pub secondary_level: Option<EducationLevelPayload>,
}

impl Sanitize for SchoolUpdate {
    fn sanitize(&mut self) {
        sanitize::text(&mut self.name);
        sanitize::phone(&mut self.phone_number1);
        sanitize::phone(&mut self.phone_number2);
        sanitize::phone(&mut self.phone_number3);
        sanitize::email(&mut self.email);
        sanitize::url(&mut self.website);
        sanitize::url(&mut self.facebook_url);
        sanitize::url(&mut self.instagram_url);
        sanitize::url(&mut self.logo_url);
        sanitize::text(&mut self.director_name);
        sanitize::text(&mut self.deputy_director_name);
        sanitize::text(&mut self.description);
        sanitize::text(&mut self.history);
        sanitize::text(&mut self.mission);
        sanitize::text(&mut self.uniform_comment);
        sanitize::text(&mut self.security_comment);
        sanitize::text(&mut self.psychologist_comment);
        sanitize::text(&mut self.special_needs_comment);
        if let Some(a) = self.address.as_mut() {
            a.sanitize();
        }
        if let Some(i) = self.infrastructure.as_mut() {
            i.sanitize();
        }
        for level in [
            self.primary_level.as_mut(),
            self.basic_level.as_mut(),
            self.secondary_level.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            level.sanitize();
        }
    }
}

fn valid_role(value: &str) -> Result<(), ValidationError> {
    value
        .trim()
        .parse::<Role>()
        .map(|_| ())
        .map_err(|_| error("role", "must be 'employee' or 'admin'"))
}

/// Body of `POST /api/auth/create-employee`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    #[validate(required(message = "is required"), email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(required(message = "is required"), length(min = 6, message = "must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(required(message = "is required"), custom(function = "valid_role"))]
    pub role: Option<String>,
}

impl EmployeePayload {
    /// Only meaningful after validation succeeded.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.trim().parse().ok())
    }
}

impl Sanitize for EmployeePayload {
    fn sanitize(&mut self) {
        sanitize::email(&mut self.email);
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    match err.code.as_ref() {
        "length" => "has an invalid length".to_string(),
        "range" => "is out of range".to_string(),
        other => format!("failed '{}' check", other),
    }
}

fn collect(prefix: &str, errors: &ValidationErrors, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let name = camel_case(field.as_ref());
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{}.{}", prefix, name)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.entry(path).or_default().extend(errs.iter().map(describe));
            }
            ValidationErrorsKind::Struct(inner) => collect(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

/// Flatten nested validator output into `"primaryLevel.price" -> [messages]`.
pub fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    collect("", errors, &mut out);
    out
}
