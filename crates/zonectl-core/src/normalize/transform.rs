// # Record transforms
//
// Small in-place passes shared by the normalizer and by adapters that read
// records back from a provider. Running them on both sides is what makes
// desired and live records comparable.

use tracing::trace;

use crate::models::{RecordConfig, RecordType};

/// Fold names to lowercase, and targets only for case-insensitive types
///
/// TXT, CAA values and other free-form targets keep their case.
pub fn downcase(records: &mut [RecordConfig]) {
    for rc in records.iter_mut() {
        rc.name = rc.name.to_lowercase();
        rc.name_fqdn = rc.name_fqdn.to_lowercase();
        if rc.rtype.policy().fold_target {
            rc.target = rc.target.to_lowercase();
        }
    }
}

/// Give every TXT record at least one segment
pub fn fix_txt(records: &mut [RecordConfig]) {
    for rc in records.iter_mut().filter(|r| r.rtype == RecordType::Txt) {
        if rc.txt_segments.is_empty() {
            trace!("synthesized TXT segment for {}", rc.name_fqdn);
            rc.txt_segments = vec![rc.target.clone()];
        }
    }
}

/// Normalize records read from a provider
pub fn post_process_records(records: &mut [RecordConfig]) {
    downcase(records);
    fix_txt(records);
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "example.com";

    #[test]
    fn test_downcase_is_selective() {
        let mut records = vec![
            RecordConfig::new(RecordType::Cname, "WWW", ORIGIN).with_target("Host.Example.NET."),
            RecordConfig::new(RecordType::Txt, "Mixed", ORIGIN).with_target("Keep Me"),
            RecordConfig::new(RecordType::Caa, "@", ORIGIN).with_target("CA.Example"),
            RecordConfig::new(RecordType::Ns, "Sub", ORIGIN).with_target("NS1.Example.NET."),
            RecordConfig::new(RecordType::Url, "go", ORIGIN).with_target("https://Example.org/Path"),
        ];
        downcase(&mut records);

        assert_eq!(records[0].name, "www");
        assert_eq!(records[0].name_fqdn, "www.example.com");
        assert_eq!(records[0].target, "host.example.net.");
        assert_eq!(records[1].name, "mixed");
        assert_eq!(records[1].target, "Keep Me");
        assert_eq!(records[2].target, "CA.Example");
        assert_eq!(records[3].target, "ns1.example.net.");
        assert_eq!(records[4].target, "https://Example.org/Path");
    }

    #[test]
    fn test_fix_txt_keeps_existing_segments() {
        let mut split = RecordConfig::new(RecordType::Txt, "@", ORIGIN);
        split.set_target_txts(vec!["a".into(), "b".into()]).unwrap();
        let mut records = vec![
            RecordConfig::new(RecordType::Txt, "@", ORIGIN).with_target("v=spf1 -all"),
            split,
            RecordConfig::new(RecordType::A, "@", ORIGIN).with_target("1.2.3.4"),
        ];
        post_process_records(&mut records);

        assert_eq!(records[0].txt_segments, vec!["v=spf1 -all".to_string()]);
        assert_eq!(records[1].txt_segments, vec!["a".to_string(), "b".to_string()]);
        assert!(records[2].txt_segments.is_empty());
    }
}
