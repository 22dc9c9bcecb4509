use crate::errors::ApiError;
use crate::view::PageView;

pub const PASSWORD_MISMATCH: &str = "Passwords Don't Match";
pub const PASSWORD_EMPTY: &str = "Password is empty";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validity {
    pub message: &'static str,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        self.message.is_empty()
    }
}

pub fn check_password(password: &str, verify: &str) -> Validity {
    let message = if password == verify { "" } else { PASSWORD_MISMATCH };
    Validity { message }
}

/// Gate run by submit handlers before anything leaves the page.
pub fn ensure_passwords_match(password: &str, verify: &str) -> Result<(), ApiError> {
    let validity = check_password(password, verify);
    if validity.is_valid() {
        Ok(())
    } else {
        Err(ApiError::validation(validity.message))
    }
}

#[derive(Debug, Default, Clone)]
pub struct PasswordForm {
    pub password: String,
    pub verify: String,
}

impl PasswordForm {
    pub fn on_password_keyup(&mut self, value: &str, view: &mut dyn PageView) {
        self.password = value.to_string();
        self.refresh(view);
    }

    pub fn on_verify_keyup(&mut self, value: &str, view: &mut dyn PageView) {
        self.verify = value.to_string();
        self.refresh(view);
    }

    fn refresh(&self, view: &mut dyn PageView) {
        view.set_verify_validity(check_password(&self.password, &self.verify).message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_empty_iff_values_match() {
        let cases = [("", ""), ("a", "a"), ("a", "b"), ("secret", "secreT"), ("x", "")];
        for (p, v) in cases {
            let validity = check_password(p, v);
            assert_eq!(validity.message.is_empty(), p == v, "p={p:?} v={v:?}");
        }
    }

    #[test]
    fn mismatch_uses_localized_message() {
        assert_eq!(check_password("a", "b").message, PASSWORD_MISMATCH);
    }

    #[test]
    fn submit_gate_rejects_mismatch() {
        assert!(ensure_passwords_match("same", "same").is_ok());
        let err = ensure_passwords_match("a", "b").unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref msg) if msg == PASSWORD_MISMATCH));
    }

    #[test]
    fn keyup_on_either_field_refreshes_validity() {
        let mut view = crate::ui::ConsoleView::new(Vec::new());
        let mut form = PasswordForm::default();
        form.on_password_keyup("abc", &mut view);
        form.on_verify_keyup("abc", &mut view);

        let output = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(output, "[verify] Passwords Don't Match\n[verify] ok\n");
    }
}
