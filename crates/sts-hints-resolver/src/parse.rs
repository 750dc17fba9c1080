//! Parsers for the `_mta-sts` TXT record and the policy file.

use sts_hints_core::{Mode, Policy};

use crate::error::{ResolverError, ResolverResult};

/// Largest `max_age` a policy may declare (about one year)
pub const MAX_MAX_AGE: u64 = 31_557_600;

/// Parsed `_mta-sts` TXT record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StsRecord {
    /// Policy id, changes whenever the policy file changes
    pub id: String,
}

/// Returns true if a TXT string claims to be an MTA-STS record
#[must_use]
pub fn is_sts_record(txt: &str) -> bool {
    txt.trim_start()
        .strip_prefix("v=STSv1")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([';', ' ', '\t']))
}

/// Parse a `v=STSv1; id=...` record.
///
/// The version tag must come first. Unknown tags are ignored.
pub fn parse_record(txt: &str) -> ResolverResult<StsRecord> {
    let mut fields = txt
        .split(';')
        .map(str::trim)
        .filter(|field| !field.is_empty());

    match fields.next().and_then(|f| f.split_once('=')) {
        Some((key, value)) if key.trim() == "v" && value.trim() == "STSv1" => {}
        _ => return Err(ResolverError::InvalidRecord("missing v=STSv1".into())),
    }

    let mut id = None;
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(ResolverError::InvalidRecord(format!("malformed field {field:?}")));
        };
        if key.trim() == "id" && id.is_none() {
            id = Some(value.trim().to_string());
        }
    }

    let id = id.ok_or_else(|| ResolverError::InvalidRecord("missing id".into()))?;
    if id.is_empty() || id.len() > 32 || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ResolverError::InvalidRecord(format!("invalid id {id:?}")));
    }

    Ok(StsRecord { id })
}

/// Pick the single MTA-STS record out of a TXT RRset.
///
/// Returns `Ok(None)` when no record claims to be MTA-STS.
pub fn select_record(txts: &[String]) -> ResolverResult<Option<StsRecord>> {
    let mut candidates = txts.iter().filter(|txt| is_sts_record(txt));
    let Some(first) = candidates.next() else {
        return Ok(None);
    };
    if candidates.next().is_some() {
        return Err(ResolverError::InvalidRecord(
            "multiple v=STSv1 records published".into(),
        ));
    }
    parse_record(first).map(Some)
}

/// Parse a policy file body.
///
/// Lines are `key: value`, separated by LF or CRLF. For `version`, `mode` and
/// `max_age` only the first occurrence counts; `mx` may repeat.
pub fn parse_policy(body: &str, id: String) -> ResolverResult<Policy> {
    let mut version = None;
    let mut mode = None;
    let mut max_age = None;
    let mut mx = Vec::new();

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(ResolverError::InvalidPolicy(format!("malformed line {line:?}")));
        };
        let value = value.trim();
        match key.trim() {
            "version" => {
                version.get_or_insert(value);
            }
            "mode" => {
                mode.get_or_insert_with(|| Mode::from(value));
            }
            "max_age" => {
                if max_age.is_none() {
                    max_age = Some(parse_max_age(value)?);
                }
            }
            "mx" => {
                if value.is_empty() {
                    return Err(ResolverError::InvalidPolicy("empty mx entry".into()));
                }
                mx.push(value.to_lowercase());
            }
            _ => (),
        }
    }

    match version {
        Some("STSv1") => {}
        Some(other) => {
            return Err(ResolverError::InvalidPolicy(format!("unsupported version {other:?}")))
        }
        None => return Err(ResolverError::InvalidPolicy("missing version".into())),
    }

    let mode = mode.ok_or_else(|| ResolverError::InvalidPolicy("missing mode".into()))?;
    let max_age = max_age.ok_or_else(|| ResolverError::InvalidPolicy("missing max_age".into()))?;

    if mx.is_empty() && mode != Mode::None {
        return Err(ResolverError::InvalidPolicy("no mx entries".into()));
    }

    Ok(Policy {
        id,
        mode,
        max_age,
        mx,
    })
}

fn parse_max_age(value: &str) -> ResolverResult<u64> {
    if value.is_empty() || value.len() > 10 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ResolverError::InvalidPolicy(format!("invalid max_age {value:?}")));
    }
    let max_age: u64 = value
        .parse()
        .map_err(|_| ResolverError::InvalidPolicy(format!("invalid max_age {value:?}")))?;
    if max_age > MAX_MAX_AGE {
        return Err(ResolverError::InvalidPolicy(format!(
            "max_age {max_age} exceeds {MAX_MAX_AGE}"
        )));
    }
    Ok(max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sts_hints_core::{is_eligible, PolicyResolution};

    #[test]
    fn parses_sts_records() {
        for (txt, id) in [
            ("v=STSv1; id=20160831085700Z;", "20160831085700Z"),
            ("v=STSv1; id=20190429T010101", "20190429T010101"),
            ("v=STSv1;id=abc;ext=ignored", "abc"),
        ] {
            assert_eq!(parse_record(txt).unwrap().id, id);
        }
    }

    #[test]
    fn rejects_bad_records() {
        for txt in [
            "id=abc; v=STSv1",
            "v=STSv2; id=abc",
            "v=STSv1",
            "v=STSv1; id=",
            "v=STSv1; id=has-dash",
            "v=STSv1; id=abc; garbage",
        ] {
            assert!(parse_record(txt).is_err(), "{txt:?} should be rejected");
        }
    }

    #[test]
    fn selects_single_sts_record() {
        let txts = vec![
            "google-site-verification=xyz".to_string(),
            "v=STSv1; id=1".to_string(),
        ];
        assert_eq!(select_record(&txts).unwrap().unwrap().id, "1");

        assert!(select_record(&["v=spf1 -all".to_string()]).unwrap().is_none());

        let duplicated = vec!["v=STSv1; id=1".to_string(), "v=STSv1; id=2".to_string()];
        assert!(select_record(&duplicated).is_err());

        assert!(!is_sts_record("v=STSv10; id=1"));
    }

    #[test]
    fn parses_enforce_policy() {
        let body = "version: STSv1\r\nmode: enforce\r\nmx: mail.example.com\r\nmx: *.example.net\r\nmax_age: 604800\r\n";
        let policy = parse_policy(body, "abc".into()).unwrap();
        assert_eq!(
            policy,
            Policy {
                id: "abc".into(),
                mode: Mode::Enforce,
                max_age: 604_800,
                mx: vec!["mail.example.com".into(), "*.example.net".into()],
            }
        );
    }

    #[test]
    fn parses_testing_policy() {
        let body = "version: STSv1\nmode: testing\nmx: gmail-smtp-in.l.google.com\nmx: *.gmail-smtp-in.l.google.com\nmax_age: 86400\n";
        let policy = parse_policy(body, "abc".into()).unwrap();
        assert_eq!(policy.mode, Mode::Testing);
        assert_eq!(policy.max_age, 86_400);
        assert_eq!(policy.mx.len(), 2);
    }

    #[test]
    fn none_mode_needs_no_mx() {
        let policy = parse_policy("version: STSv1\nmode: none\nmax_age: 3600\n", "1".into()).unwrap();
        assert_eq!(policy.mode, Mode::None);
        assert!(policy.mx.is_empty());
    }

    #[test]
    fn unknown_mode_is_valid_but_ineligible() {
        let body = "version: STSv1\nmode: strict\nmx: a.example\nmax_age: 604800\n";
        let policy = parse_policy(body, "1".into()).unwrap();
        assert_eq!(policy.mode, Mode::Other("strict".into()));

        let verdict = is_eligible(&PolicyResolution::Valid(policy));
        assert_eq!(verdict.reason().unwrap().to_string(), "mode:strict");
    }

    #[test]
    fn rejects_bad_policies() {
        for body in [
            "mode: enforce\nmx: a.example\nmax_age: 604800",
            "version: STSv2\nmode: enforce\nmx: a.example\nmax_age: 604800",
            "version: STSv1\nmx: a.example\nmax_age: 604800",
            "version: STSv1\nmode: enforce\nmx: a.example",
            "version: STSv1\nmode: enforce\nmx: a.example\nmax_age: -1",
            "version: STSv1\nmode: enforce\nmx: a.example\nmax_age: 31557601",
            "version: STSv1\nmode: enforce\nmax_age: 604800",
            "version: STSv1\nmode enforce\nmx: a.example\nmax_age: 604800",
            "<html>not a policy</html>",
        ] {
            assert!(parse_policy(body, "1".into()).is_err(), "{body:?} should be rejected");
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let body = "version: STSv1\nmode: enforce\nmode: testing\nmx: a.example\nmax_age: 604800\nmax_age: 60\n";
        let policy = parse_policy(body, "1".into()).unwrap();
        assert_eq!(policy.mode, Mode::Enforce);
        assert_eq!(policy.max_age, 604_800);
    }
}
