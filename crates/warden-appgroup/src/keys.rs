//! Storage layout
//!
//! ```text
//! app/<name>                         AppEntry
//! group/<name>                       GroupEntry
//! secret_id/app/<name>/<hash>        SecretIdRecord
//! secret_id/group/<name>/<hash>      SecretIdRecord
//! secret_id/supergroup/<hash>        SecretIdRecord
//! ```

use crate::selector::Selector;

pub(crate) const APP_PREFIX: &str = "app/";
pub(crate) const GROUP_PREFIX: &str = "group/";
pub(crate) const SECRET_ID_PREFIX: &str = "secret_id/";

pub(crate) fn app_key(name: &str) -> String {
    format!("{APP_PREFIX}{name}")
}

pub(crate) fn group_key(name: &str) -> String {
    format!("{GROUP_PREFIX}{name}")
}

/// Namespace holding every SecretID record issued against `selector`
pub(crate) fn secret_id_namespace(selector: &Selector) -> String {
    format!("{SECRET_ID_PREFIX}{selector}/")
}

pub(crate) fn secret_id_key(selector: &Selector, hashed_id: &str) -> String {
    format!("{}{hashed_id}", secret_id_namespace(selector))
}

/// Hashed id of a record key (the last path component)
pub(crate) fn hashed_id_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(app_key("web"), "app/web");
        assert_eq!(
            secret_id_key(&Selector::Group("ops".into()), "ab12"),
            "secret_id/group/ops/ab12"
        );
        assert_eq!(
            secret_id_key(&Selector::SuperGroup, "ab12"),
            "secret_id/supergroup/ab12"
        );
        assert_eq!(hashed_id_of("secret_id/app/web/ab12"), "ab12");
    }

    #[test]
    fn test_namespaces_do_not_overlap() {
        // `app/web` must not list records of `app/web2`
        let web = secret_id_namespace(&Selector::App("web".into()));
        let web2 = secret_id_key(&Selector::App("web2".into()), "ff");
        assert!(!web2.starts_with(&web));
    }
}
