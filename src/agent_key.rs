//! Pool keys.
//!
//! A key names the socket bucket a request is routed to:
//! `<host>+ip:<ip>[+port:<port>][+localAddress:<addr>][+family:<4|6>]`.

use crate::lookup::Family;
use crate::request::RequestOptions;

/// Stands in for the address when none is known.
pub const NO_IP: &str = "_none_";

pub fn build_key(identity: &str, ip: Option<&str>, options: &RequestOptions) -> String {
    let mut key = format!("{}+ip:{}", identity, ip.unwrap_or(NO_IP));

    if let Some(port) = options.port.filter(|port| *port != 0) {
        key.push_str(&format!("+port:{}", port));
    }

    if let Some(local_address) = options.local_address.as_deref().filter(|addr| !addr.is_empty()) {
        key.push_str(&format!("+localAddress:{}", local_address));
    }

    if let Some(family) = options.family.and_then(|family| Family::try_from(family).ok()) {
        key.push_str(&format!("+family:{}", family));
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host() {
        let options = RequestOptions::new("foo");
        assert_eq!(build_key("foo", Some("bar"), &options), "foo+ip:bar");
        assert_eq!(build_key("foo2", None, &options), "foo2+ip:_none_");
    }

    #[test]
    fn all_parts_in_order() {
        let options = RequestOptions::new("foo")
            .with_port(8080)
            .with_local_address("10.0.0.5")
            .with_family(6);
        assert_eq!(
            build_key("foo", Some("::1"), &options),
            "foo+ip:::1+port:8080+localAddress:10.0.0.5+family:6"
        );
    }

    #[test]
    fn family_only_for_four_or_six() {
        for (family, suffix) in [(4, "+family:4"), (6, "+family:6"), (0, ""), (5, ""), (46, "")] {
            let options = RequestOptions::new("foo").with_family(family);
            assert_eq!(build_key("foo", Some("bar"), &options), format!("foo+ip:bar{}", suffix));
        }
    }

    #[test]
    fn empty_parts_are_skipped() {
        let options = RequestOptions::new("foo").with_port(0).with_local_address("");
        assert_eq!(build_key("foo", None, &options), "foo+ip:_none_");
    }

    #[test]
    fn identical_inputs_give_identical_keys() {
        let a = RequestOptions::new("foo").with_port(443).with_family(4);
        let b = a.clone();
        assert_eq!(build_key("foo", Some("1.2.3.4"), &a), build_key("foo", Some("1.2.3.4"), &b));
    }
}
