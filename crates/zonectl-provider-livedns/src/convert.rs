// Conversions between record sets on the wire and `RecordConfig`s.
//
// Values use zone-file presentation: `"50 fb.mail.example.net."` for MX,
// `0 issue "ca.example"` for CAA, quoted strings for TXT.

use zonectl_core::diff::group_records;
use zonectl_core::models::{RecordConfig, RecordType};
use zonectl_core::Result;

use crate::api::RecordInfo;

/// Expand record sets into one `RecordConfig` per value
///
/// Every record keeps the set it came from in `original`.
pub fn record_configs_from_info(infos: &[RecordInfo], origin: &str) -> Result<Vec<RecordConfig>> {
    let mut records = Vec::new();
    for info in infos {
        let rtype: RecordType = info.rtype.parse()?;
        let original = serde_json::to_value(info)?;
        for value in &info.values {
            let mut rc = RecordConfig::new(rtype, info.name.clone(), origin).with_ttl(info.ttl);
            if rtype.is_compound() || rtype == RecordType::Txt {
                rc.target = value.clone();
                rc.combined_target = true;
                rc.split_target()?;
            } else {
                rc.set_target(value.clone());
            }
            rc.original = Some(original.clone());
            records.push(rc);
        }
    }
    Ok(records)
}

/// Collapse records into one set per `(label, type)`
///
/// Values keep the order the records were given in; the set TTL follows the
/// group TTL policy of the diff.
pub fn records_to_info(records: &[RecordConfig]) -> Vec<RecordInfo> {
    group_records(records)
        .into_values()
        .map(|group| RecordInfo {
            name: group.key.name.clone(),
            rtype: group.key.rtype.to_string(),
            ttl: group.ttl,
            values: group.records.iter().map(RecordConfig::content).collect(),
        })
        .collect()
}
