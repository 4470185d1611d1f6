//! The target codec.
//!
//! `target` holds the record's value. For simple types it is the whole
//! value; for MX, SRV, CAA and TLSA it is the host/value part and the
//! remaining fields live in their own attributes until
//! [`RecordConfig::merge_to_target`] serializes everything into one string.
//! [`split_combined`] and [`RecordConfig::split_target`] invert that.

use std::fmt;

use super::record::{Compound, RecordConfig, RecordType};
use crate::error::{Error, Result};

/// Structured fields recovered from a combined value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetFields {
    Mx {
        preference: u16,
        target: String,
    },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Caa {
        flag: u8,
        tag: String,
        value: String,
    },
    Tlsa {
        usage: u8,
        selector: u8,
        matching_type: u8,
        target: String,
    },
}

fn digits<'a>(field: &str, token: &'a str) -> Result<&'a str> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::codec(format!("{} {:?} is not an unsigned integer", field, token)));
    }
    Ok(token)
}

fn parse_u16(field: &str, token: &str) -> Result<u16> {
    digits(field, token)?
        .parse::<u16>()
        .map_err(|_| Error::codec(format!("{} {:?} does not fit into a uint16", field, token)))
}

fn parse_u8(field: &str, token: &str) -> Result<u8> {
    digits(field, token)?
        .parse::<u8>()
        .map_err(|_| Error::codec(format!("{} {:?} does not fit into a uint8", field, token)))
}

fn fields<'a>(rtype: RecordType, s: &'a str, arity: usize) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() != arity {
        return Err(Error::codec(format!(
            "{} value {:?} has {} fields, expected {}",
            rtype,
            s,
            parts.len(),
            arity
        )));
    }
    Ok(parts)
}

/// Split `"10 mx.example.com."` into preference and host
pub fn split_combined_mx(s: &str) -> Result<(u16, String)> {
    let parts = fields(RecordType::Mx, s, 2)?;
    Ok((parse_u16("MX preference", parts[0])?, parts[1].to_string()))
}

/// Split `"5 10 5060 sip.example.com."` into priority, weight, port and host
pub fn split_combined_srv(s: &str) -> Result<(u16, u16, u16, String)> {
    let parts = fields(RecordType::Srv, s, 4)?;
    Ok((
        parse_u16("SRV priority", parts[0])?,
        parse_u16("SRV weight", parts[1])?,
        parse_u16("SRV port", parts[2])?,
        parts[3].to_string(),
    ))
}

/// Split `0 issue "letsencrypt.org"` into flag, tag and value
///
/// The value may contain spaces; one pair of surrounding single or double
/// quotes is removed.
pub fn split_combined_caa(s: &str) -> Result<(u8, String, String)> {
    let parts: Vec<&str> = s.trim().splitn(3, ' ').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(Error::codec(format!(
            "CAA value {:?} must be \"<flag> <tag> <value>\"",
            s
        )));
    }
    let flag = parse_u8("CAA flag", parts[0])?;
    Ok((flag, parts[1].to_string(), unquote(parts[2]).to_string()))
}

/// Split `"3 1 1 abcdef..."` into usage, selector, matching type and data
pub fn split_combined_tlsa(s: &str) -> Result<(u8, u8, u8, String)> {
    let parts = fields(RecordType::Tlsa, s, 4)?;
    Ok((
        parse_u8("TLSA usage", parts[0])?,
        parse_u8("TLSA selector", parts[1])?,
        parse_u8("TLSA matching type", parts[2])?,
        parts[3].to_string(),
    ))
}

/// Split a combined value of a compound `rtype`
pub fn split_combined(rtype: RecordType, s: &str) -> Result<TargetFields> {
    match rtype.policy().compound {
        Compound::Mx => {
            let (preference, target) = split_combined_mx(s)?;
            Ok(TargetFields::Mx { preference, target })
        }
        Compound::Srv => {
            let (priority, weight, port, target) = split_combined_srv(s)?;
            Ok(TargetFields::Srv {
                priority,
                weight,
                port,
                target,
            })
        }
        Compound::Caa => {
            let (flag, tag, value) = split_combined_caa(s)?;
            Ok(TargetFields::Caa { flag, tag, value })
        }
        Compound::Tlsa => {
            let (usage, selector, matching_type, target) = split_combined_tlsa(s)?;
            Ok(TargetFields::Tlsa {
                usage,
                selector,
                matching_type,
                target,
            })
        }
        Compound::None => Err(Error::codec(format!("{} has no combined form", rtype))),
    }
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Render TXT segments as space-separated quoted strings
pub fn quote_txt_segments(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse space-separated quoted strings back into segments
///
/// Input without any quotes is a single segment.
pub fn parse_txt_segments(s: &str) -> Result<Vec<String>> {
    let s = s.trim();
    if !s.starts_with('"') {
        return Ok(vec![s.to_string()]);
    }

    let mut segments = Vec::new();
    let mut chars = s.chars();
    loop {
        match chars.next() {
            None => break,
            Some(c) if c.is_whitespace() => continue,
            Some('"') => {
                let mut seg = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped) => seg.push(escaped),
                            None => break,
                        },
                        '"' => {
                            closed = true;
                            break;
                        }
                        other => seg.push(other),
                    }
                }
                if !closed {
                    return Err(Error::codec(format!("unterminated TXT string in {:?}", s)));
                }
                segments.push(seg);
            }
            Some(other) => {
                return Err(Error::codec(format!(
                    "unexpected {:?} between TXT strings in {:?}",
                    other, s
                )));
            }
        }
    }
    Ok(segments)
}

impl RecordConfig {
    fn expect_type(&self, rtype: RecordType, setter: &str) -> Result<()> {
        if self.rtype != rtype {
            return Err(Error::integrity(format!(
                "{} called on a {} record ({})",
                setter, self.rtype, self.name_fqdn
            )));
        }
        Ok(())
    }

    /// Target of a single-valued type
    pub fn target_single(&self) -> Result<&str> {
        if self.rtype.is_compound() || self.rtype == RecordType::Txt {
            return Err(Error::integrity(format!(
                "target_single called on multi-parameter type {}",
                self.rtype
            )));
        }
        Ok(&self.target)
    }

    /// Set the target of any type
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    pub fn set_target_mx(&mut self, preference: u16, target: impl Into<String>) -> Result<()> {
        self.expect_type(RecordType::Mx, "set_target_mx")?;
        self.mx_preference = preference;
        self.target = target.into();
        Ok(())
    }

    pub fn set_target_mx_parse(&mut self, preference: &str, target: &str) -> Result<()> {
        let preference = parse_u16("MX preference", preference)?;
        self.set_target_mx(preference, target)
    }

    pub fn set_target_srv(
        &mut self,
        priority: u16,
        weight: u16,
        port: u16,
        target: impl Into<String>,
    ) -> Result<()> {
        self.expect_type(RecordType::Srv, "set_target_srv")?;
        self.srv_priority = priority;
        self.srv_weight = weight;
        self.srv_port = port;
        self.target = target.into();
        Ok(())
    }

    pub fn set_target_srv_parse(
        &mut self,
        priority: &str,
        weight: &str,
        port: &str,
        target: &str,
    ) -> Result<()> {
        self.set_target_srv(
            parse_u16("SRV priority", priority)?,
            parse_u16("SRV weight", weight)?,
            parse_u16("SRV port", port)?,
            target,
        )
    }

    pub fn set_target_caa(
        &mut self,
        flag: u8,
        tag: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.expect_type(RecordType::Caa, "set_target_caa")?;
        self.caa_flag = flag;
        self.caa_tag = tag.into();
        self.target = value.into();
        Ok(())
    }

    pub fn set_target_caa_parse(&mut self, flag: &str, tag: &str, value: &str) -> Result<()> {
        self.set_target_caa(parse_u8("CAA flag", flag)?, tag, value)
    }

    pub fn set_target_tlsa(
        &mut self,
        usage: u8,
        selector: u8,
        matching_type: u8,
        target: impl Into<String>,
    ) -> Result<()> {
        self.expect_type(RecordType::Tlsa, "set_target_tlsa")?;
        self.tlsa_usage = usage;
        self.tlsa_selector = selector;
        self.tlsa_matching_type = matching_type;
        self.target = target.into();
        Ok(())
    }

    pub fn set_target_tlsa_parse(
        &mut self,
        usage: &str,
        selector: &str,
        matching_type: &str,
        target: &str,
    ) -> Result<()> {
        self.set_target_tlsa(
            parse_u8("TLSA usage", usage)?,
            parse_u8("TLSA selector", selector)?,
            parse_u8("TLSA matching type", matching_type)?,
            target,
        )
    }

    /// Set a single-string TXT value
    pub fn set_target_txt(&mut self, text: impl Into<String>) -> Result<()> {
        self.expect_type(RecordType::Txt, "set_target_txt")?;
        let text = text.into();
        self.txt_segments = vec![text.clone()];
        self.target = text;
        Ok(())
    }

    /// Set a multi-string TXT value; `target` becomes the concatenation
    pub fn set_target_txts(&mut self, segments: Vec<String>) -> Result<()> {
        self.expect_type(RecordType::Txt, "set_target_txts")?;
        self.target = segments.concat();
        self.txt_segments = segments;
        Ok(())
    }

    /// All fields of the value in zone-file order
    ///
    /// A combined record and any pseudo type return the bare target.
    pub fn content(&self) -> String {
        if self.combined_target {
            return self.target.clone();
        }
        let policy = self.rtype.policy();
        if policy.pseudo {
            return self.target.clone();
        }
        match policy.compound {
            Compound::Mx => format!("{} {}", self.mx_preference, self.target),
            Compound::Srv => format!(
                "{} {} {} {}",
                self.srv_priority, self.srv_weight, self.srv_port, self.target
            ),
            Compound::Caa => format!("{} {} \"{}\"", self.caa_flag, self.caa_tag, self.target),
            Compound::Tlsa => format!(
                "{} {} {} {}",
                self.tlsa_usage, self.tlsa_selector, self.tlsa_matching_type, self.target
            ),
            Compound::None if self.rtype == RecordType::Txt => {
                if self.txt_segments.is_empty() {
                    quote_txt_segments(std::slice::from_ref(&self.target))
                } else {
                    quote_txt_segments(&self.txt_segments)
                }
            }
            Compound::None => self.target.clone(),
        }
    }

    /// Fold every structured field into `target` and zero the fields
    ///
    /// Merging twice would double-encode the value, so a record that is
    /// already combined is an integrity violation.
    pub fn merge_to_target(&mut self) -> Result<()> {
        if self.combined_target {
            return Err(Error::integrity(format!(
                "merge_to_target: already collapsed: {} {}",
                self.name, self.target
            )));
        }

        self.target = self.content();

        self.mx_preference = 0;
        self.srv_priority = 0;
        self.srv_weight = 0;
        self.srv_port = 0;
        self.caa_flag = 0;
        self.caa_tag.clear();
        self.tlsa_usage = 0;
        self.tlsa_selector = 0;
        self.tlsa_matching_type = 0;

        self.combined_target = true;
        Ok(())
    }

    /// Undo [`merge_to_target`](Self::merge_to_target)
    ///
    /// A codec error leaves the record untouched.
    pub fn split_target(&mut self) -> Result<()> {
        if !self.combined_target {
            return Err(Error::integrity(format!(
                "split_target: not combined: {} {}",
                self.name, self.target
            )));
        }

        if self.rtype == RecordType::Txt {
            let segments = parse_txt_segments(&self.target)?;
            self.target = segments.concat();
            self.txt_segments = segments;
            self.combined_target = false;
            return Ok(());
        }

        if self.rtype.is_compound() {
            match split_combined(self.rtype, &self.target)? {
                TargetFields::Mx { preference, target } => {
                    self.mx_preference = preference;
                    self.target = target;
                }
                TargetFields::Srv {
                    priority,
                    weight,
                    port,
                    target,
                } => {
                    self.srv_priority = priority;
                    self.srv_weight = weight;
                    self.srv_port = port;
                    self.target = target;
                }
                TargetFields::Caa { flag, tag, value } => {
                    self.caa_flag = flag;
                    self.caa_tag = tag;
                    self.target = value;
                }
                TargetFields::Tlsa {
                    usage,
                    selector,
                    matching_type,
                    target,
                } => {
                    self.tlsa_usage = usage;
                    self.tlsa_selector = selector;
                    self.tlsa_matching_type = matching_type;
                    self.target = target;
                }
            }
        }

        self.combined_target = false;
        Ok(())
    }
}

/// Canonical full-content rendering used in correction messages
impl fmt::Display for RecordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.combined_target {
            return f.write_str(&self.target);
        }

        match self.rtype {
            RecordType::Soa => write!(f, "{} {} {} {}", self.rtype, self.name, self.target, self.ttl)?,
            _ => write!(f, "{} {} {} {}", self.rtype, self.name_fqdn, self.target, self.ttl)?,
        }

        match self.rtype.policy().compound {
            Compound::Mx => write!(f, " pref={}", self.mx_preference)?,
            Compound::Srv => write!(
                f,
                " srvpriority={} srvweight={} srvport={}",
                self.srv_priority, self.srv_weight, self.srv_port
            )?,
            Compound::Tlsa => write!(
                f,
                " tlsausage={} tlsaselector={} tlsamatchingtype={}",
                self.tlsa_usage, self.tlsa_selector, self.tlsa_matching_type
            )?,
            Compound::Caa => write!(f, " caatag={} caaflag={}", self.caa_tag, self.caa_flag)?,
            Compound::None => {}
        }

        // BTreeMap iterates in key order, keeping the output stable
        for (k, v) in &self.metadata {
            write!(f, " {}={}", k, v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    const ORIGIN: &str = "example.com";

    fn mx(pref: u16, host: &str) -> RecordConfig {
        let mut rc = RecordConfig::new(RecordType::Mx, "@", ORIGIN);
        rc.set_target_mx(pref, host).unwrap();
        rc
    }

    fn srv(priority: u16, weight: u16, port: u16, host: &str) -> RecordConfig {
        let mut rc = RecordConfig::new(RecordType::Srv, "_sip._tcp", ORIGIN);
        rc.set_target_srv(priority, weight, port, host).unwrap();
        rc
    }

    #[test]
    fn test_merge_mx() {
        let mut rc = mx(10, "aspmx2.googlemail.com.");
        rc.merge_to_target().unwrap();
        assert_eq!(rc.target, "10 aspmx2.googlemail.com.");
        assert_eq!(rc.mx_preference, 0);
        assert!(rc.combined_target);
    }

    #[test]
    fn test_merge_srv_field_order() {
        let mut rc = srv(5, 10, 5060, "sip.example.com.");
        rc.merge_to_target().unwrap();
        assert_eq!(rc.target, "5 10 5060 sip.example.com.");
        assert_eq!((rc.srv_priority, rc.srv_weight, rc.srv_port), (0, 0, 0));
    }

    #[test]
    fn test_double_merge_rejected() {
        let mut rc = mx(10, "mx.example.com.");
        rc.merge_to_target().unwrap();
        let merged = rc.target.clone();

        let err = rc.merge_to_target().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Integrity);
        assert_eq!(rc.target, merged, "second merge must not re-encode");
    }

    #[test]
    fn test_round_trip_compound_types() {
        let mut caa = RecordConfig::new(RecordType::Caa, "@", ORIGIN);
        caa.set_target_caa(128, "issue", "letsencrypt.org; validationmethods=dns-01")
            .unwrap();
        let mut tlsa = RecordConfig::new(RecordType::Tlsa, "_443._tcp", ORIGIN);
        tlsa.set_target_tlsa(3, 1, 255, "0123456789abcdef").unwrap();

        let records = vec![
            mx(0, "a.example.com."),
            mx(u16::MAX, "b.example.com."),
            srv(0, 0, 0, "c.example.com."),
            srv(u16::MAX, u16::MAX, u16::MAX, "d.example.com."),
            caa,
            tlsa,
        ];

        for original in records {
            let mut rc = original.clone();
            rc.merge_to_target().unwrap();
            rc.split_target().unwrap();
            assert_eq!(rc, original);
        }
    }

    #[test]
    fn test_split_rejects_out_of_range() {
        let err = split_combined_mx("65536 mx.example.com.").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Codec);

        assert!(split_combined_srv("1 2 70000 host.").is_err());
        assert!(split_combined_srv("-1 2 3 host.").is_err());
        assert!(split_combined_caa("256 issue \"ca.example\"").is_err());
        assert!(split_combined_tlsa("3 1 256 abcd").is_err());
    }

    #[test]
    fn test_split_rejects_signed_numbers() {
        let err = split_combined_mx("+10 mx.example.com.").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Codec);
        assert!(split_combined_srv("1 +2 3 host.").is_err());
        assert!(split_combined_caa("+0 issue \"ca.example\"").is_err());
        assert!(split_combined_tlsa("3 1 +1 abcd").is_err());

        let mut rc = RecordConfig::new(RecordType::Mx, "@", "example.com");
        assert!(rc.set_target_mx_parse("+10", "mx.example.com.").is_err());
    }

    #[test]
    fn test_split_rejects_wrong_arity() {
        assert!(split_combined_mx("10").is_err());
        assert!(split_combined_mx("10 a. b.").is_err());
        assert!(split_combined_srv("1 2 host.").is_err());
        assert!(split_combined_tlsa("3 1 1").is_err());
        assert!(split_combined_caa("0 issue").is_err());
    }

    #[test]
    fn test_split_caa_strips_quotes() {
        let (flag, tag, value) = split_combined_caa("0 issue \"www.certinomis.com\"").unwrap();
        assert_eq!((flag, tag.as_str(), value.as_str()), (0, "issue", "www.certinomis.com"));

        let (_, tag, value) = split_combined_caa("0 iodef 'mailto:sec@example.com'").unwrap();
        assert_eq!(tag, "iodef");
        assert_eq!(value, "mailto:sec@example.com");
    }

    #[test]
    fn test_failed_split_leaves_record_untouched() {
        let mut rc = RecordConfig::new(RecordType::Mx, "@", ORIGIN);
        rc.target = "99999 mx.example.com.".to_string();
        rc.combined_target = true;
        let before = rc.clone();
        assert!(rc.split_target().is_err());
        assert_eq!(rc, before);
    }

    #[test]
    fn test_setter_type_mismatch_is_integrity() {
        let mut rc = RecordConfig::new(RecordType::A, "www", ORIGIN);
        assert!(rc.set_target_mx(10, "mx.").unwrap_err().is_integrity());
        assert!(rc.target_single().is_ok());

        let rc = mx(10, "mx.");
        assert!(rc.target_single().unwrap_err().is_integrity());
    }

    #[test]
    fn test_parse_setters_report_codec_errors() {
        let mut rc = RecordConfig::new(RecordType::Srv, "_x._tcp", ORIGIN);
        let err = rc.set_target_srv_parse("1", "2", "99999", "h.").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Codec);
    }

    #[test]
    fn test_render() {
        let rc = RecordConfig::new(RecordType::A, "www", ORIGIN)
            .with_target("127.0.0.1")
            .with_ttl(500);
        assert_eq!(rc.to_string(), "A www.example.com 127.0.0.1 500");

        let rc = srv(1, 2, 3, "h.example.com.");
        assert_eq!(
            rc.to_string(),
            "SRV _sip._tcp.example.com h.example.com. 300 srvpriority=1 srvweight=2 srvport=3"
        );
    }

    #[test]
    fn test_render_metadata_sorted() {
        let a = RecordConfig::new(RecordType::Cname, "www", ORIGIN)
            .with_target("host.")
            .with_meta("zeta", "1")
            .with_meta("alpha", "2");
        let b = RecordConfig::new(RecordType::Cname, "www", ORIGIN)
            .with_target("host.")
            .with_meta("alpha", "2")
            .with_meta("zeta", "1");
        assert_eq!(a.to_string(), "CNAME www.example.com host. 300 alpha=2 zeta=1");
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_txt_segments_quoting() {
        let segments = vec!["test 2".to_string(), "say \"hi\"".to_string()];
        let quoted = quote_txt_segments(&segments);
        assert_eq!(quoted, r#""test 2" "say \"hi\"""#);
        assert_eq!(parse_txt_segments(&quoted).unwrap(), segments);
        assert_eq!(parse_txt_segments("plain").unwrap(), vec!["plain".to_string()]);
        assert!(parse_txt_segments("\"open").is_err());
    }
}
