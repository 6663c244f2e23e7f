use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{info, warn};
use sorted_vec::SortedVec;

use crate::charset::DeviceCharset;
use crate::error::{CcmlError, Result};
use crate::format::{MAX_NOTATION_LENGTH, MAX_TITLE_LENGTH};
use crate::method::Method;
use crate::ringing::{convert_notation, lead_count, Row, BELLS};
use crate::search::{Classifier, JUMP_CHAR_COUNT};
use crate::source::{read_methods_from_path, MethodFilter, RawMethod};
use crate::store::StoreWriter;

/// Average records per index bucket the depth choice aims for.
const TARGET_BUCKET_LOAD: u64 = 10;

/// Outcome of one store build.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: u8,
    pub methods: usize,
    pub depth: u8,
    pub bytes: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub stages: Vec<StageReport>,
    /// Records dropped for per-record reasons (unmappable title, over
    /// length, unclassifiable).
    pub rejected: usize,
}

/// Filename character for a stage, taken from the bell alphabet.
pub fn stage_char(stage: u8) -> Result<char> {
    if stage == 0 || stage as usize > 16 {
        return Err(CcmlError::InvalidArgument(format!(
            "stage {} is out of range",
            stage
        )));
    }
    Ok(BELLS.as_bytes()[stage as usize - 1] as char)
}

/// Index depth keeping the average bucket load near the target: the
/// floor of log base `JUMP_CHAR_COUNT` of `count / TARGET_BUCKET_LOAD`,
/// never below zero.
pub fn choose_depth(count: usize) -> u8 {
    let mut depth = 0u8;
    let mut threshold = TARGET_BUCKET_LOAD * JUMP_CHAR_COUNT;
    while count as u64 >= threshold {
        depth += 1;
        threshold = threshold.saturating_mul(JUMP_CHAR_COUNT);
    }
    depth
}

/// Build one store record from a source entry. Per-record failures come
/// back as the recoverable error variants; inconsistent source data is an
/// invariant violation and fatal.
pub fn build_method(
    charset: &DeviceCharset,
    classifier: &Classifier<'_>,
    raw: &RawMethod,
) -> Result<Method> {
    let lead_head = Row::parse(&raw.lead_head)?;
    if lead_head.stage() != raw.stage as usize {
        return Err(CcmlError::InvariantViolation(format!(
            "method {:?}: lead head {} does not match stage {}",
            raw.title, raw.lead_head, raw.stage
        )));
    }

    let lead_count = lead_count(&lead_head)?;
    let hunts = lead_head.unchanged_places();
    // an absent declared count means zero hunt bells
    let declared = raw.number_of_hunts.unwrap_or(0);
    if declared as usize != hunts.len() {
        return Err(CcmlError::InvariantViolation(format!(
            "method {:?}: declares {} hunt bells, lead head {} fixes {}",
            raw.title,
            declared,
            raw.lead_head,
            hunts.len()
        )));
    }
    let mut hunt_bells: u16 = 0;
    for place in hunts {
        if place >= 16 {
            return Err(CcmlError::InvariantViolation(format!(
                "method {:?}: hunt bell at place {} is beyond the bitmask",
                raw.title,
                place + 1
            )));
        }
        hunt_bells |= 1 << place;
    }

    let device_title = charset.encode(&raw.title)?;
    if device_title.len() + 1 > MAX_TITLE_LENGTH {
        return Err(CcmlError::TitleTooLong(raw.title.clone()));
    }
    let key = classifier.classify(&raw.title)?;
    let notation = convert_notation(&raw.notation)?;
    if notation.len() > MAX_NOTATION_LENGTH {
        return Err(CcmlError::NotationTooLong(raw.title.clone()));
    }

    Ok(Method {
        stage: raw.stage,
        title: raw.title.clone(),
        device_title,
        sort_title: key.sort_text,
        notation,
        lead_count,
        hunt_bells,
    })
}

/// Convert accepted source entries to records, grouped and sorted per
/// stage. Recoverable record failures are logged and counted.
pub fn collect_methods(
    raw_methods: &[RawMethod],
    filter: &dyn MethodFilter,
) -> Result<(BTreeMap<u8, SortedVec<Method>>, usize)> {
    let charset = DeviceCharset::new()?;
    let classifier = Classifier::new(&charset);

    let mut stages: BTreeMap<u8, SortedVec<Method>> = BTreeMap::new();
    let mut rejected = 0usize;

    for raw in raw_methods {
        if !filter.accept(raw) {
            continue;
        }
        match build_method(&charset, &classifier, raw) {
            Ok(method) => {
                stages.entry(method.stage).or_default().insert(method);
            }
            Err(e) if e.is_record_fatal() => {
                warn!("skipping {:?}: {}", raw.title, e);
                rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok((stages, rejected))
}

/// Read the source XML and write one store file per stage into `out_dir`.
pub fn build_stores(
    input: &Path,
    filter: &dyn MethodFilter,
    out_dir: &Path,
) -> Result<BuildReport> {
    let raw_methods = read_methods_from_path(input)?;
    info!("read {} methods from {}", raw_methods.len(), input.display());

    let (stages, rejected) = collect_methods(&raw_methods, filter)?;
    fs::create_dir_all(out_dir)?;

    let mut report = BuildReport {
        rejected,
        ..BuildReport::default()
    };
    for (stage, methods) in stages {
        let methods = methods.into_vec();
        let depth = choose_depth(methods.len());
        let path = out_dir.join(format!("methods-{}.ccml", stage_char(stage)?));

        let file = BufWriter::new(File::create(&path)?);
        let writer = StoreWriter::new(file, stage, depth)?;
        let bytes = writer.write_store(&methods)?;

        info!(
            "stage {}: {} methods, depth {}, {} bytes -> {}",
            stage,
            methods.len(),
            depth,
            bytes,
            path.display()
        );
        report.stages.push(StageReport {
            stage,
            methods: methods.len(),
            depth,
            bytes,
            path,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Classification;

    fn raw(title: &str, stage: u8, lead_head: &str, notation: &str) -> RawMethod {
        RawMethod {
            title: title.to_string(),
            notation: notation.to_string(),
            stage,
            lead_head: lead_head.to_string(),
            number_of_hunts: Some(1),
            classification: Some(Classification::default()),
        }
    }

    #[test]
    fn depth_tracks_record_count() {
        assert_eq!(choose_depth(0), 0);
        assert_eq!(choose_depth(10), 0);
        assert_eq!(choose_depth(279), 0);
        assert_eq!(choose_depth(280), 1);
        assert_eq!(choose_depth(7839), 1);
        assert_eq!(choose_depth(7840), 2);
    }

    #[test]
    fn stage_chars_follow_bell_alphabet() {
        assert_eq!(stage_char(6).unwrap(), '6');
        assert_eq!(stage_char(10).unwrap(), '0');
        assert_eq!(stage_char(12).unwrap(), 'T');
        assert_eq!(stage_char(16).unwrap(), 'D');
        assert!(stage_char(0).is_err());
        assert!(stage_char(17).is_err());
    }

    #[test]
    fn builds_plain_bob_major() {
        let charset = DeviceCharset::new().unwrap();
        let classifier = Classifier::new(&charset);
        let raw = raw("Plain Bob Major", 8, "13527486", "-18-18-18-18,12");
        let method = build_method(&charset, &classifier, &raw).unwrap();
        assert_eq!(method.sort_title, "PLAIN BOB MAJOR");
        assert_eq!(method.lead_count, 7);
        assert_eq!(method.hunt_bells, 1);
        assert_eq!(method.notation.len(), 16);
    }

    #[test]
    fn hunt_count_mismatch_is_fatal() {
        let charset = DeviceCharset::new().unwrap();
        let classifier = Classifier::new(&charset);
        let mut entry = raw("Plain Bob Major", 8, "13527486", "-18");
        entry.number_of_hunts = Some(2);
        let err = build_method(&charset, &classifier, &entry).unwrap_err();
        assert!(matches!(err, CcmlError::InvariantViolation(_)));
        assert!(!err.is_record_fatal());
    }

    #[test]
    fn absent_hunt_count_means_zero() {
        let charset = DeviceCharset::new().unwrap();
        let classifier = Classifier::new(&charset);
        // 13527486 fixes the treble, so an undeclared count cannot pass
        let mut entry = raw("Plain Bob Major", 8, "13527486", "-18");
        entry.number_of_hunts = None;
        let err = build_method(&charset, &classifier, &entry).unwrap_err();
        assert!(matches!(err, CcmlError::InvariantViolation(_)));
    }

    #[test]
    fn lead_head_stage_mismatch_is_fatal() {
        let charset = DeviceCharset::new().unwrap();
        let classifier = Classifier::new(&charset);
        let entry = raw("Plain Bob Major", 8, "135264", "-18");
        let err = build_method(&charset, &classifier, &entry).unwrap_err();
        assert!(matches!(err, CcmlError::InvariantViolation(_)));
    }

    #[test]
    fn unclassifiable_title_is_recoverable() {
        let charset = DeviceCharset::new().unwrap();
        let classifier = Classifier::new(&charset);
        let entry = raw("鐘", 8, "13527486", "-18");
        let err = build_method(&charset, &classifier, &entry).unwrap_err();
        assert!(err.is_record_fatal());
    }

    #[test]
    fn collect_groups_by_stage_and_sorts() {
        struct Everything;
        impl MethodFilter for Everything {
            fn accept(&self, _: &RawMethod) -> bool {
                true
            }
        }

        let entries = vec![
            raw("Zeta Bob Minor", 6, "135264", "-16"),
            raw("Alpha Bob Minor", 6, "135264", "-16"),
            raw("Plain Bob Major", 8, "13527486", "-18"),
        ];
        let (stages, rejected) = collect_methods(&entries, &Everything).unwrap();
        assert_eq!(rejected, 0);
        assert_eq!(stages.len(), 2);
        let minor = &stages[&6];
        assert_eq!(minor[0].title, "Alpha Bob Minor");
        assert_eq!(minor[1].title, "Zeta Bob Minor");
    }
}
