//! Start/stop/catchup policy resolution for stream requests.
//!
//! `StreamOptions` collects the user-facing toggles and resolves them into
//! one immutable [`ReceiveBlocksRequest`]. Resolution is pure and total:
//! conflicting options are settled by precedence, never rejected.

use crate::stream::proto::{
    block_id, receive_blocks_request, BlockId, BlockMessageDeliverySettings,
    BlockStreamDeliverySettings, ReceiveBlocksRequest,
};

/// Where delivery starts; target-bearing kinds carry the height inline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartPolicy {
    EarliestAvailable,
    LatestAvailable,
    ExactlyOn(u64),
    ExactlyAfter(u64),
    ClosestTo(u64),
    EarliestAfter(u64),
}

impl StartPolicy {
    /// Returns the target height for kinds that carry one.
    pub fn target(&self) -> Option<u64> {
        match *self {
            StartPolicy::EarliestAvailable | StartPolicy::LatestAvailable => None,
            StartPolicy::ExactlyOn(height)
            | StartPolicy::ExactlyAfter(height)
            | StartPolicy::ClosestTo(height)
            | StartPolicy::EarliestAfter(height) => Some(height),
        }
    }
}

/// Where delivery stops, if ever.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopPolicy {
    Never,
    Before(u64),
    After(u64),
}

/// How the server handles a start point that requires replaying history.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CatchupPolicy {
    /// The server must fail the stream instead of replaying.
    Panic,
    /// Block until caught up; deliver nothing meanwhile.
    Wait,
    /// Deliver catchup data interleaved, flagged as such.
    Stream,
}

/// User intents for one `ReceiveBlocks` call.
///
/// Height fields use 0 as "unset" — the wire protocol reserves height 0 as
/// absent, so height 0 can never be targeted explicitly. This is a known
/// limitation carried over from the server contract, not a bug.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StreamOptions {
    /// Logical block stream to subscribe to; passed through opaquely.
    pub stream_name: String,
    /// Start on the latest block in the stream.
    pub start_on_latest: bool,
    /// Start exactly on the given height (0 means unset).
    pub start_exactly_on: u64,
    /// Start exactly after the given height (0 means unset).
    pub start_exactly_after: u64,
    /// Start on the block closest to the given height (0 means unset).
    pub start_on: u64,
    /// Start on the earliest block after the given height (0 means unset).
    pub start_after: u64,
    /// Stop before the given height (0 means unset).
    pub stop_before: u64,
    /// Stop after the given height (0 means unset).
    pub stop_after: u64,
    /// Exclude block payload bytes from live delivery (headers only).
    pub exclude_payload: bool,
    /// Allow catchup and wait for it.
    pub wait_catchup: bool,
    /// Allow catchup and stream it; overrides `wait_catchup`.
    pub stream_catchup: bool,
    /// Exclude block payload bytes from catchup delivery.
    pub exclude_catchup_payload: bool,
}

impl StreamOptions {
    /// Creates options with defaults for the given stream.
    pub fn new(stream_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            ..Self::default()
        }
    }

    /// Resolves the start intents; later rules win.
    ///
    /// The order below is a compatibility contract with the server and must
    /// not be rearranged: latest, exactly-on, exactly-after, closest-to,
    /// earliest-after.
    pub fn start_policy(&self) -> StartPolicy {
        let mut policy = StartPolicy::EarliestAvailable;
        if self.start_on_latest {
            policy = StartPolicy::LatestAvailable;
        }
        if self.start_exactly_on != 0 {
            policy = StartPolicy::ExactlyOn(self.start_exactly_on);
        }
        if self.start_exactly_after != 0 {
            policy = StartPolicy::ExactlyAfter(self.start_exactly_after);
        }
        if self.start_on != 0 {
            policy = StartPolicy::ClosestTo(self.start_on);
        }
        if self.start_after != 0 {
            policy = StartPolicy::EarliestAfter(self.start_after);
        }
        policy
    }

    /// Resolves the stop intents, independent of the start chain.
    pub fn stop_policy(&self) -> StopPolicy {
        let mut policy = StopPolicy::Never;
        if self.stop_before != 0 {
            policy = StopPolicy::Before(self.stop_before);
        }
        if self.stop_after != 0 {
            policy = StopPolicy::After(self.stop_after);
        }
        policy
    }

    /// Resolves the catchup intents; `Stream` wins over `Wait`.
    pub fn catchup_policy(&self) -> CatchupPolicy {
        let mut policy = CatchupPolicy::Panic;
        if self.wait_catchup {
            policy = CatchupPolicy::Wait;
        }
        if self.stream_catchup {
            policy = CatchupPolicy::Stream;
        }
        policy
    }

    /// Builds the immutable request descriptor sent when the call opens.
    pub fn build_request(&self) -> ReceiveBlocksRequest {
        use receive_blocks_request::{CatchupPolicy as WireCatchup, StartPolicy as WireStart};
        use receive_blocks_request::StopPolicy as WireStop;

        let (start_policy, start_target) = match self.start_policy() {
            StartPolicy::EarliestAvailable => (WireStart::StartOnEarliestAvailable, None),
            StartPolicy::LatestAvailable => (WireStart::StartOnLatestAvailable, None),
            StartPolicy::ExactlyOn(height) => {
                (WireStart::StartExactlyOnTarget, Some(whole_block_id(height)))
            }
            StartPolicy::ExactlyAfter(height) => (
                WireStart::StartExactlyAfterTarget,
                Some(whole_block_id(height)),
            ),
            StartPolicy::ClosestTo(height) => (
                WireStart::StartOnClosestToTarget,
                Some(whole_block_id(height)),
            ),
            StartPolicy::EarliestAfter(height) => (
                WireStart::StartOnEarliestAfterTarget,
                Some(whole_block_id(height)),
            ),
        };

        let (stop_policy, stop_target) = match self.stop_policy() {
            StopPolicy::Never => (WireStop::StopNever, None),
            StopPolicy::Before(height) => (WireStop::StopBeforeTarget, Some(whole_block_id(height))),
            StopPolicy::After(height) => (WireStop::StopAfterTarget, Some(whole_block_id(height))),
        };

        let catchup_policy = match self.catchup_policy() {
            CatchupPolicy::Panic => WireCatchup::CatchupPanic,
            CatchupPolicy::Wait => WireCatchup::CatchupWait,
            CatchupPolicy::Stream => WireCatchup::CatchupStream,
        };

        ReceiveBlocksRequest {
            stream_name: self.stream_name.clone(),
            start_policy: start_policy as i32,
            start_target,
            stop_policy: stop_policy as i32,
            stop_target,
            delivery_settings: Some(delivery_settings(self.exclude_payload)),
            catchup_policy: catchup_policy as i32,
            catchup_delivery_settings: Some(delivery_settings(self.exclude_catchup_payload)),
        }
    }
}

fn whole_block_id(height: u64) -> BlockId {
    BlockId {
        kind: block_id::Kind::WholeMessage as i32,
        height,
    }
}

fn delivery_settings(exclude_payload: bool) -> BlockStreamDeliverySettings {
    BlockStreamDeliverySettings {
        content: Some(BlockMessageDeliverySettings { exclude_payload }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::proto::receive_blocks_request::{
        CatchupPolicy as WireCatchup, StartPolicy as WireStart, StopPolicy as WireStop,
    };

    fn options() -> StreamOptions {
        StreamOptions::new("test_blocks")
    }

    #[test]
    fn defaults_select_earliest_never_panic() {
        let opts = options();
        assert_eq!(opts.start_policy(), StartPolicy::EarliestAvailable);
        assert_eq!(opts.stop_policy(), StopPolicy::Never);
        assert_eq!(opts.catchup_policy(), CatchupPolicy::Panic);

        let request = opts.build_request();
        assert_eq!(request.stream_name, "test_blocks");
        assert_eq!(
            request.start_policy,
            WireStart::StartOnEarliestAvailable as i32
        );
        assert_eq!(request.start_target, None);
        assert_eq!(request.stop_policy, WireStop::StopNever as i32);
        assert_eq!(request.stop_target, None);
        assert_eq!(request.catchup_policy, WireCatchup::CatchupPanic as i32);
    }

    #[test]
    fn each_start_kind_carries_a_target_iff_required() {
        let cases = [
            (options(), StartPolicy::EarliestAvailable, None),
            (
                StreamOptions {
                    start_on_latest: true,
                    ..options()
                },
                StartPolicy::LatestAvailable,
                None,
            ),
            (
                StreamOptions {
                    start_exactly_on: 7,
                    ..options()
                },
                StartPolicy::ExactlyOn(7),
                Some(7),
            ),
            (
                StreamOptions {
                    start_exactly_after: 8,
                    ..options()
                },
                StartPolicy::ExactlyAfter(8),
                Some(8),
            ),
            (
                StreamOptions {
                    start_on: 9,
                    ..options()
                },
                StartPolicy::ClosestTo(9),
                Some(9),
            ),
            (
                StreamOptions {
                    start_after: 10,
                    ..options()
                },
                StartPolicy::EarliestAfter(10),
                Some(10),
            ),
        ];

        for (opts, expected_policy, expected_target) in cases {
            let policy = opts.start_policy();
            assert_eq!(policy, expected_policy);
            assert_eq!(policy.target(), expected_target);

            let request = opts.build_request();
            assert_eq!(
                request.start_target.map(|id| id.height),
                expected_target,
                "target present iff the kind requires one: {expected_policy:?}"
            );
        }
    }

    #[test]
    fn start_precedence_later_rule_wins_for_each_adjacent_pair() {
        // latest < exactly-on
        let opts = StreamOptions {
            start_on_latest: true,
            start_exactly_on: 5,
            ..options()
        };
        assert_eq!(opts.start_policy(), StartPolicy::ExactlyOn(5));

        // exactly-on < exactly-after
        let opts = StreamOptions {
            start_exactly_on: 5,
            start_exactly_after: 6,
            ..options()
        };
        assert_eq!(opts.start_policy(), StartPolicy::ExactlyAfter(6));

        // exactly-after < closest-to
        let opts = StreamOptions {
            start_exactly_after: 6,
            start_on: 7,
            ..options()
        };
        assert_eq!(opts.start_policy(), StartPolicy::ClosestTo(7));

        // closest-to < earliest-after
        let opts = StreamOptions {
            start_on: 7,
            start_after: 8,
            ..options()
        };
        assert_eq!(opts.start_policy(), StartPolicy::EarliestAfter(8));
    }

    #[test]
    fn all_start_options_set_selects_the_last_rule() {
        let opts = StreamOptions {
            start_on_latest: true,
            start_exactly_on: 1,
            start_exactly_after: 2,
            start_on: 3,
            start_after: 4,
            ..options()
        };
        assert_eq!(opts.start_policy(), StartPolicy::EarliestAfter(4));
    }

    #[test]
    fn zero_heights_never_activate_a_policy() {
        let opts = StreamOptions {
            start_exactly_on: 0,
            start_exactly_after: 0,
            start_on: 0,
            start_after: 0,
            stop_before: 0,
            stop_after: 0,
            ..options()
        };
        assert_eq!(opts.start_policy(), StartPolicy::EarliestAvailable);
        assert_eq!(opts.stop_policy(), StopPolicy::Never);
    }

    #[test]
    fn stop_precedence_after_wins_over_before() {
        let opts = StreamOptions {
            stop_before: 100,
            stop_after: 200,
            ..options()
        };
        assert_eq!(opts.stop_policy(), StopPolicy::After(200));

        let opts = StreamOptions {
            stop_before: 100,
            ..options()
        };
        assert_eq!(opts.stop_policy(), StopPolicy::Before(100));
    }

    #[test]
    fn start_and_stop_selection_are_independent() {
        let start_cases: Vec<(StreamOptions, StartPolicy)> = vec![
            (options(), StartPolicy::EarliestAvailable),
            (
                StreamOptions {
                    start_on_latest: true,
                    ..options()
                },
                StartPolicy::LatestAvailable,
            ),
            (
                StreamOptions {
                    start_after: 50,
                    ..options()
                },
                StartPolicy::EarliestAfter(50),
            ),
        ];
        let stop_cases: Vec<(u64, u64, StopPolicy)> = vec![
            (0, 0, StopPolicy::Never),
            (70, 0, StopPolicy::Before(70)),
            (0, 80, StopPolicy::After(80)),
        ];

        for (start_opts, expected_start) in &start_cases {
            for (stop_before, stop_after, expected_stop) in &stop_cases {
                let opts = StreamOptions {
                    stop_before: *stop_before,
                    stop_after: *stop_after,
                    ..start_opts.clone()
                };
                assert_eq!(opts.start_policy(), *expected_start);
                assert_eq!(opts.stop_policy(), *expected_stop);
            }
        }
    }

    #[test]
    fn stream_catchup_overrides_wait_catchup() {
        let opts = StreamOptions {
            wait_catchup: true,
            ..options()
        };
        assert_eq!(opts.catchup_policy(), CatchupPolicy::Wait);

        let opts = StreamOptions {
            wait_catchup: true,
            stream_catchup: true,
            ..options()
        };
        assert_eq!(opts.catchup_policy(), CatchupPolicy::Stream);
    }

    #[test]
    fn delivery_flags_map_per_phase() {
        let opts = StreamOptions {
            exclude_payload: true,
            exclude_catchup_payload: false,
            ..options()
        };
        let request = opts.build_request();

        let live = request
            .delivery_settings
            .and_then(|settings| settings.content)
            .expect("live delivery settings");
        assert!(live.exclude_payload);

        let catchup = request
            .catchup_delivery_settings
            .and_then(|settings| settings.content)
            .expect("catchup delivery settings");
        assert!(!catchup.exclude_payload);
    }

    #[test]
    fn built_request_targets_use_whole_message_ids() {
        let opts = StreamOptions {
            start_exactly_on: 42,
            stop_after: 99,
            ..options()
        };
        let request = opts.build_request();

        let start = request.start_target.expect("start target");
        assert_eq!(start.kind, block_id::Kind::WholeMessage as i32);
        assert_eq!(start.height, 42);

        let stop = request.stop_target.expect("stop target");
        assert_eq!(stop.height, 99);
        assert_eq!(request.stop_policy, WireStop::StopAfterTarget as i32);
    }
}
