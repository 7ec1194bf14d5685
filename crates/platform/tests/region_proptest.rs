//! Property-based tests for DMA region access and the audio newtypes.
//! Verifies invariants hold for ALL inputs, not just fixed examples.

use platform::dma_region::{DmaRegion, RegionError, WORD_BYTES};
use platform::{ChannelCount, PeriodFrames, SampleRateHz};

proptest::proptest! {
    /// Word access never panics and succeeds exactly when aligned and in bounds.
    #[test]
    fn word_access_matches_bounds(words in 1usize..64, offset in 0usize..512) {
        let mut backing = vec![0u32; words];
        let region = DmaRegion::from_slice(&mut backing, 0);
        let in_bounds = offset % WORD_BYTES == 0 && offset + WORD_BYTES <= words * WORD_BYTES;

        let result = region.write_word(offset, 0xA5A5_A5A5);
        assert_eq!(result.is_ok(), in_bounds);
        if offset % WORD_BYTES != 0 {
            assert_eq!(result, Err(RegionError::Misaligned(offset)));
        }
        if in_bounds {
            assert_eq!(region.read_word(offset), Ok(0xA5A5_A5A5));
        }
    }

    /// `fill` touches only the requested span.
    #[test]
    fn fill_stays_inside_span(words in 2usize..32, start in 0usize..16, count in 0usize..16) {
        let mut backing = vec![0u32; words];
        {
            let region = DmaRegion::from_slice(&mut backing, 0);
            let _ = region.fill(start * WORD_BYTES, count * WORD_BYTES, 7);
        }
        let fits = start + count <= words;
        for (i, w) in backing.iter().enumerate() {
            let inside = fits && i >= start && i < start + count;
            assert_eq!(*w == 7, inside, "word {i}");
        }
    }

    /// Only the four supported period sizes are accepted.
    #[test]
    fn period_frames_rejects_everything_else(frames in 0u32..1024) {
        let ok = PeriodFrames::new(frames).is_ok();
        assert_eq!(ok, matches!(frames, 16 | 32 | 64 | 128));
    }

    /// Channel counts in 1..=8 round-trip through `get`.
    #[test]
    fn channel_count_range(channels in 0u32..32) {
        match ChannelCount::new(channels) {
            Ok(c) => assert_eq!(c.get(), channels),
            Err(e) => {
                assert!(channels == 0 || channels > ChannelCount::MAX);
                assert_eq!(e.value, channels);
            }
        }
    }

    /// SampleRateHz::new never panics and enforces 8000–192000.
    #[test]
    fn sample_rate_bounds(hz in 0u32..400_000) {
        let ok = SampleRateHz::new(hz).is_ok();
        assert_eq!(ok, (8_000..=192_000).contains(&hz));
    }
}
