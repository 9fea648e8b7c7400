#[cfg(test)]
mod test {
    use crate::patch::bps::{BPS_MAGIC, BpsPatch};
    use crate::patch::number::{encode_number, encode_offset};
    use crate::patch::{PatchError, PatchFormat, apply_patch, verify_sha1};

    const FIFO_PATCH: &[u8] = include_bytes!("../../assets/fifo_testrom.bps");
    const FIFO_SOURCE_LEN: usize = 40976;

    const SOURCE_READ: u64 = 0;
    const TARGET_READ: u64 = 1;
    const SOURCE_COPY: u64 = 2;
    const TARGET_COPY: u64 = 3;

    fn action(kind: u64, length: u64, out: &mut Vec<u8>) {
        encode_number(((length - 1) << 2) | kind, out);
    }

    fn build_patch(source: &[u8], target: &[u8], metadata: &str, actions: &[u8]) -> Vec<u8> {
        let mut patch = BPS_MAGIC.to_vec();
        encode_number(source.len() as u64, &mut patch);
        encode_number(target.len() as u64, &mut patch);
        encode_number(metadata.len() as u64, &mut patch);
        patch.extend_from_slice(metadata.as_bytes());
        patch.extend_from_slice(actions);
        patch.extend(crc32fast::hash(source).to_le_bytes());
        patch.extend(crc32fast::hash(target).to_le_bytes());
        let checksum = crc32fast::hash(&patch);
        patch.extend(checksum.to_le_bytes());
        patch
    }

    #[test]
    fn test_fixture_header() {
        let patch = BpsPatch::parse(FIFO_PATCH).unwrap();
        assert_eq!(patch.source_size, FIFO_SOURCE_LEN);
        assert_eq!(patch.target_size, FIFO_SOURCE_LEN);
        assert_eq!(patch.metadata, "");
        assert_eq!(patch.source_checksum, 0x47C2_0647);
        assert_eq!(patch.target_checksum, 0x7B55_42E2);
        assert_eq!(patch.patch_checksum, 0x3483_364E);
        assert_eq!(patch.actions().len(), FIFO_PATCH.len() - 11 - 12);
    }

    #[test]
    fn test_fixture_decode_is_deterministic() {
        let patch = BpsPatch::parse(FIFO_PATCH).unwrap();
        let source = vec![0u8; FIFO_SOURCE_LEN];
        let first = patch.apply(&source).unwrap();
        let second = patch.apply(&source).unwrap();
        assert_eq!(first, second);
        assert_eq!(crc32fast::hash(&first), patch.target_checksum);
        assert_eq!(&first[..4], b"NES\x1A");
    }

    #[test]
    fn test_fixture_mutations_are_detected() {
        let patch = BpsPatch::parse(FIFO_PATCH).unwrap();
        let source = vec![0u8; FIFO_SOURCE_LEN];

        for index in (0..patch.actions.len()).step_by(97) {
            let mut mutated = patch.clone();
            mutated.actions[index] ^= 0x01;
            assert!(
                mutated.apply(&source).is_err(),
                "mutation at action byte {} went undetected",
                index
            );
        }
    }

    #[test]
    fn test_target_copy_expands_runs() {
        let source = vec![0u8; 4];
        let target = b"AAAAAAAA".to_vec();

        let mut actions = Vec::new();
        action(TARGET_READ, 1, &mut actions);
        actions.push(b'A');
        action(TARGET_COPY, 7, &mut actions);
        encode_offset(0, &mut actions);

        let patch = build_patch(&source, &target, "", &actions);
        let result = BpsPatch::parse(&patch).unwrap().apply(&source).unwrap();
        assert_eq!(result, target);
    }

    #[test]
    fn test_target_copy_repeats_pattern() {
        let source = vec![0u8; 2];
        let target = b"abcabcabca".to_vec();

        let mut actions = Vec::new();
        action(TARGET_READ, 3, &mut actions);
        actions.extend_from_slice(b"abc");
        action(TARGET_COPY, 7, &mut actions);
        encode_offset(0, &mut actions);

        let patch = build_patch(&source, &target, "", &actions);
        let result = BpsPatch::parse(&patch).unwrap().apply(&source).unwrap();
        assert_eq!(result, target);
    }

    #[test]
    fn test_source_actions_with_relative_offsets() {
        let source: Vec<u8> = (0..16).collect();
        // 0..4 in place, then 12..16, then back to 4..8
        let mut target: Vec<u8> = (0..4).collect();
        target.extend(12..16);
        target.extend(4..8);

        let mut actions = Vec::new();
        action(SOURCE_READ, 4, &mut actions);
        action(SOURCE_COPY, 4, &mut actions);
        encode_offset(12, &mut actions);
        action(SOURCE_COPY, 4, &mut actions);
        encode_offset(-12, &mut actions);

        let patch = build_patch(&source, &target, "made by hand", &actions);
        let parsed = BpsPatch::parse(&patch).unwrap();
        assert_eq!(parsed.metadata, "made by hand");
        assert_eq!(parsed.apply(&source).unwrap(), target);
    }

    #[test]
    fn test_bad_magic_fails_before_checksum() {
        let mut patch = FIFO_PATCH.to_vec();
        patch[..4].copy_from_slice(b"XYZ1");
        assert!(matches!(
            BpsPatch::parse(&patch),
            Err(PatchError::BadMagic { found, .. }) if found == b"XYZ1"
        ));
        assert!(matches!(
            BpsPatch::parse(b"XYZ1"),
            Err(PatchError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_patch_checksum_mismatch() {
        let mut patch = FIFO_PATCH.to_vec();
        patch[20] ^= 0xFF;
        assert!(matches!(
            BpsPatch::parse(&patch),
            Err(PatchError::PatchChecksum { expected: 0x3483_364E, .. })
        ));
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            BpsPatch::parse(b"BPS1\x80\x80\x80"),
            Err(PatchError::TooShort(7))
        ));
    }

    #[test]
    fn test_source_checks() {
        let patch = BpsPatch::parse(FIFO_PATCH).unwrap();
        assert!(matches!(
            patch.apply(&[0u8; 16]),
            Err(PatchError::SourceSize { expected: FIFO_SOURCE_LEN, actual: 16 })
        ));

        let mut source = vec![0u8; FIFO_SOURCE_LEN];
        source[100] = 1;
        assert!(matches!(
            patch.apply(&source),
            Err(PatchError::SourceChecksum { expected: 0x47C2_0647, .. })
        ));
    }

    #[test]
    fn test_target_checksum_mismatch() {
        let source = vec![0u8; 4];
        let mut actions = Vec::new();
        action(TARGET_READ, 2, &mut actions);
        actions.extend_from_slice(b"hi");

        // declared target differs from what the actions produce
        let patch = build_patch(&source, b"ho", "", &actions);
        assert!(matches!(
            BpsPatch::parse(&patch).unwrap().apply(&source),
            Err(PatchError::TargetChecksum { .. })
        ));
    }

    #[test]
    fn test_truncated_target_read() {
        let source = vec![0u8; 4];
        let mut actions = Vec::new();
        action(TARGET_READ, 4, &mut actions);
        actions.extend_from_slice(b"ab");

        let patch = build_patch(&source, b"abcd", "", &actions);
        assert!(matches!(
            BpsPatch::parse(&patch).unwrap().apply(&source),
            Err(PatchError::Truncated(_))
        ));
    }

    #[test]
    fn test_copy_before_start_of_source() {
        let source = vec![0u8; 4];
        let mut actions = Vec::new();
        action(SOURCE_COPY, 2, &mut actions);
        encode_offset(-1, &mut actions);

        let patch = build_patch(&source, &[0, 0], "", &actions);
        assert!(matches!(
            BpsPatch::parse(&patch).unwrap().apply(&source),
            Err(PatchError::OutOfBounds { action: "SourceCopy", offset: -1, length: 2 })
        ));
    }

    #[test]
    fn test_output_overrun() {
        let source = vec![0u8; 4];
        let mut actions = Vec::new();
        action(SOURCE_READ, 4, &mut actions);

        let patch = build_patch(&source, &[0, 0], "", &actions);
        assert!(matches!(
            BpsPatch::parse(&patch).unwrap().apply(&source),
            Err(PatchError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_apply_patch_dispatch() {
        assert_eq!(PatchFormat::detect(FIFO_PATCH), Some(PatchFormat::Bps));
        assert_eq!(PatchFormat::detect(b"PATCHEOF"), Some(PatchFormat::Ips));
        assert_eq!(PatchFormat::detect(b"UPS1"), None);

        let rom = apply_patch(vec![0u8; FIFO_SOURCE_LEN], FIFO_PATCH).unwrap();
        assert_eq!(crc32fast::hash(&rom), 0x7B55_42E2);

        let rom = apply_patch(vec![0u8; 2], b"PATCH\x00\x00\x00\x00\x01\x42EOF").unwrap();
        assert_eq!(rom, [0x42, 0]);

        assert!(matches!(
            apply_patch(vec![], b"UPS1"),
            Err(PatchError::UnknownFormat)
        ));
    }

    #[test]
    fn test_sha1_verification() {
        let digest = "a9993e364706816aba3e25717850c26c9cd0d89d";
        assert!(verify_sha1(b"abc", digest).is_ok());
        assert!(verify_sha1(b"abc", &digest.to_uppercase()).is_ok());
        assert!(matches!(
            verify_sha1(b"abd", digest),
            Err(PatchError::Sha1Mismatch { .. })
        ));
    }
}
