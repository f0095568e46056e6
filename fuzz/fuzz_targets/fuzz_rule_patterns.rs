#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_rewrite_proxy::{Rule, RuleResult};

// First line is the pattern, second the target, the rest metric names.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut lines = text.lines();
    let (Some(pattern), Some(target)) = (lines.next(), lines.next()) else {
        return;
    };

    let Ok(rule) = Rule::matching(pattern, target) else {
        return;
    };

    for name in lines {
        if let RuleResult::Match { tags, .. } = rule.evaluate(name) {
            assert!(tags.iter().all(|tag| tag.contains(':')));
        }
    }
});
