use super::*;

fn valid_form() -> RegistrationForm {
    RegistrationForm {
        name: "Asha O'Neil-Rao".into(),
        email: "asha@example.com".into(),
        contact: "9876543210".into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
        gender: "female".into(),
        date: "1950-04-12".into(),
        user_type: "Elder".into(),
        emergency_contact: "9123456780".into(),
    }
}

#[test]
fn email_checks() {
    assert_eq!(email_error(""), Some("Email is required."));
    assert_eq!(email_error("   "), Some("Email is required."));
    assert_eq!(email_error("asha@"), Some("Invalid email format."));
    assert_eq!(email_error("asha@example.c"), Some("Invalid email format."));
    assert_eq!(email_error("asha.rao+care@mail.example.in"), None);
}

#[test]
fn login_reports_both_fields() {
    let errors = validate_login("", "123").unwrap_err();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.get("email"), Some("Email is required."));
    assert_eq!(errors.get("password"), Some("Password must be at least 6 characters."));
    assert_eq!(
        errors.to_string(),
        "email: Email is required.; password: Password must be at least 6 characters."
    );
}

#[test]
fn login_accepts_valid_input() {
    assert!(validate_login("asha@example.com", "secret1").is_ok());
    assert_eq!(
        validate_login("asha@example.com", "      ").unwrap_err().get("password"),
        Some("Password is required.")
    );
}

#[test]
fn registration_accepts_valid_form() {
    assert!(validate_registration(&valid_form()).is_ok());
    let mut caretaker = valid_form();
    caretaker.user_type = "Caretaker".into();
    caretaker.gender = "Other".into();
    assert!(validate_registration(&caretaker).is_ok());
}

#[test]
fn registration_reports_every_failing_field() {
    let errors = validate_registration(&RegistrationForm::default()).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|(field, _)| field).collect();
    assert_eq!(
        fields,
        vec![
            "name",
            "email",
            "contact",
            "password",
            "confirmPassword",
            "gender",
            "date",
            "userType",
            "emergencyContact"
        ]
    );
}

#[test]
fn registration_field_rules() {
    let mut form = valid_form();
    form.name = "R2-D2".into();
    form.contact = "98765".into();
    form.confirm_password = "secret2".into();
    form.gender = "unknown".into();
    form.date = "12/04/1950".into();
    form.user_type = "Admin".into();
    form.emergency_contact = "91234567801".into();

    let errors = validate_registration(&form).unwrap_err();
    assert!(errors.get("name").is_some());
    assert_eq!(errors.get("contact"), Some("Invalid contact number"));
    assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
    assert!(errors.get("gender").is_some());
    assert_eq!(errors.get("date"), Some("Date of Birth must be YYYY-MM-DD"));
    assert_eq!(errors.get("userType"), Some("User Type must be Elder or Caretaker"));
    assert_eq!(errors.get("emergencyContact"), Some("Invalid emergency contact number"));
    assert!(errors.get("email").is_none());
}

#[test]
fn registration_rejects_impossible_dates() {
    let mut form = valid_form();
    form.date = "1950-13-01".into();
    assert_eq!(validate_registration(&form).unwrap_err().get("date"), Some("Invalid Date of Birth"));
}

#[test]
fn reset_requires_both_fields_then_equality() {
    assert_eq!(validate_reset("", "x").unwrap_err().get("password"), Some("Both fields are required."));
    assert_eq!(
        validate_reset("newpass", "newpas").unwrap_err().get("confirmPassword"),
        Some("Passwords do not match.")
    );
    assert!(validate_reset("newpass", "newpass").is_ok());
}
