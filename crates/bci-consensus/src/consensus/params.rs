use std::sync::RwLock;

use bitcoin::hashes::Hash;
use bitcoin::BlockHash;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::network::{Magic, Network};
use crate::pow::Target;

/// Version-bits deployments carried by the params record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deployment {
    TestDummy = 0,
    Csv = 1,
    Segwit = 2,
}

/// Activation schedule of one version-bits deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentParams {
    pub bit: u8,
    pub start_time: i64,
    pub timeout: i64,
}

// 0x0000ffff * 256^28: the limit shared by the legacy, premine-start and
// post-fork regimes on main and test.
const POW_LIMIT_MAIN: Target = Target::new(U256([0, 0, 0, 0x0000_ffff_0000_0000]));
// 0x7fff...ff: regtest mines at will.
const POW_LIMIT_REGTEST: Target =
    Target::new(U256([u64::MAX, u64::MAX, u64::MAX, 0x7fff_ffff_ffff_ffff]));

/// Immutable consensus parameters for one network.
///
/// A single flat record per network; the per-network values differ, the shape
/// does not. Everything consensus reads lives here, plus the wire-level
/// constants (magic, ports, address prefixes) the core carries as data but
/// never interprets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Network these parameters describe.
    pub network: Network,

    /// Blocks between subsidy halvings.
    pub subsidy_halving_interval: u32,
    /// Height at which the BCI fork activates.
    pub bci_height: u32,
    /// Number of premined blocks directly after the BCI fork.
    pub bci_premine_window: u32,
    /// Height of the coin-transfer payout.
    pub bci_coin_transfer_height: u32,
    /// Amount moved at the coin-transfer height, in satoshis.
    pub bci_coin_transfer_amount: u64,
    /// Last height that pays a block reward.
    pub bci_last_height_with_reward: u32,
    /// Height at which header hashing switches to ProgPoW. Zero means the
    /// chain has always hashed with ProgPoW; a large value disables it.
    pub prog_fork_height: u32,
    /// Bitcoin-chain block the fork anchored to.
    pub bitcoin_postfork_block: BlockHash,

    /// Upper target bound for pre-BCI headers.
    pub pow_limit_legacy: Target,
    /// Fixed bootstrap target while the averaging window fills.
    pub pow_limit_start: Target,
    /// Upper target bound for post-BCI headers.
    pub pow_limit_postfork: Target,

    /// Number of blocks averaged by the windowed retarget.
    pub pow_averaging_window: u32,
    /// Maximum upward difficulty adjustment, percent.
    pub pow_max_adjust_up: u32,
    /// Maximum downward difficulty adjustment, percent.
    pub pow_max_adjust_down: u32,
    /// Legacy retarget period in seconds.
    pub pow_target_timespan_legacy: u64,
    /// Expected seconds between blocks.
    pub pow_target_spacing: u64,
    /// Testnet rule: permit minimum-difficulty blocks after a time gap.
    pub allow_min_difficulty: bool,
    /// Regtest rule: the legacy retarget returns the previous bits untouched.
    pub no_retargeting: bool,

    /// Equihash width parameter for pre-ProgPoW solutions.
    pub equihash_n: u32,
    /// Equihash depth parameter for pre-ProgPoW solutions.
    pub equihash_k: u32,

    /// Blocks that must signal within a confirmation window to lock in a
    /// deployment.
    pub rule_change_activation_threshold: u32,
    /// Version-bits signalling window size.
    pub miner_confirmation_window: u32,
    /// Version-bits deployment table, indexed by [`Deployment`].
    pub deployments: [DeploymentParams; 3],

    /// Post-fork message-start bytes.
    pub magic: Magic,
    /// Pre-fork message-start bytes.
    pub magic_legacy: Magic,
    /// Default P2P port.
    pub default_port: u16,
    /// Port the anchored Bitcoin network listens on.
    pub bitcoin_default_port: u16,
    /// Base58 prefix for pay-to-pubkey-hash addresses.
    pub base58_pubkey_prefix: u8,
    /// Base58 prefix for pay-to-script-hash addresses.
    pub base58_script_prefix: u8,
    /// Base58 prefix for WIF secret keys.
    pub base58_secret_prefix: u8,
    /// BIP32 extended public key version bytes.
    pub ext_public_key_prefix: [u8; 4],
    /// BIP32 extended secret key version bytes.
    pub ext_secret_key_prefix: [u8; 4],
}

impl NetworkParams {
    /// Consensus parameters for the BCI main network.
    pub fn mainnet() -> Self { Self {
        network: Network::Mainnet,
        subsidy_halving_interval: 100_000_000,
        bci_height: 0,
        bci_premine_window: 0,
        bci_coin_transfer_height: 850,
        bci_coin_transfer_amount: 1_851_040_046_271_426,
        bci_last_height_with_reward: 281_665,
        prog_fork_height: 0,
        bitcoin_postfork_block: BlockHash::from_byte_array([
            0xb8, 0x70, 0x2e, 0x07, 0xa2, 0x84, 0x2d, 0xb1, 0xcf, 0xf7, 0xd0, 0xa7, 0xb2, 0x35,
            0xfc, 0x71, 0xdf, 0x29, 0xe6, 0x71, 0x1f, 0xd1, 0xf2, 0x06, 0x6b, 0xeb, 0xa4, 0xb1,
            0xe7, 0x00, 0x00, 0x00,
        ]),
        pow_limit_legacy: POW_LIMIT_MAIN,
        pow_limit_start: POW_LIMIT_MAIN,
        pow_limit_postfork: POW_LIMIT_MAIN,
        pow_averaging_window: 30,
        pow_max_adjust_up: 16,
        pow_max_adjust_down: 32,
        pow_target_timespan_legacy: 14 * 24 * 60 * 60,
        pow_target_spacing: 10 * 60,
        allow_min_difficulty: false,
        no_retargeting: false,
        equihash_n: 80,
        equihash_k: 4,
        rule_change_activation_threshold: 806, // 80% of 1008
        miner_confirmation_window: 1008,
        deployments: [
            DeploymentParams { bit: 28, start_time: 1_199_145_601, timeout: 1_230_767_999 },
            DeploymentParams { bit: 0, start_time: 1_548_979_200, timeout: 1_579_046_400 },
            DeploymentParams { bit: 1, start_time: 1_548_979_200, timeout: 1_579_046_400 },
        ],
        magic: Magic::MAINNET,
        magic_legacy: Magic::MAINNET_LEGACY,
        default_port: 8334,
        bitcoin_default_port: 8334,
        base58_pubkey_prefix: 102, // addresses start with 'i'
        base58_script_prefix: 23,  // addresses start with 'A'
        base58_secret_prefix: 128,
        ext_public_key_prefix: [0x04, 0x88, 0xb2, 0x1e],
        ext_secret_key_prefix: [0x04, 0x88, 0xad, 0xe4],
    } }

    /// Consensus parameters for the BCI test network.
    pub fn testnet() -> Self { Self {
        network: Network::Testnet,
        subsidy_halving_interval: 100_000_000,
        bci_height: 0,
        bci_premine_window: 0,
        bci_coin_transfer_height: 850,
        bci_coin_transfer_amount: 1_851_040_046_271_426,
        bci_last_height_with_reward: 281_665,
        prog_fork_height: 0,
        bitcoin_postfork_block: BlockHash::from_byte_array([
            0x8b, 0xf2, 0x0b, 0xdf, 0xdb, 0xe0, 0x5d, 0x7c, 0x56, 0x4c, 0x19, 0x7a, 0xf7, 0x15,
            0xb8, 0xa5, 0x99, 0xa6, 0x11, 0xff, 0x61, 0xda, 0xc8, 0xba, 0xd9, 0xc2, 0x93, 0xef,
            0x00, 0x00, 0x00, 0x00,
        ]),
        pow_limit_legacy: POW_LIMIT_MAIN,
        pow_limit_start: POW_LIMIT_MAIN,
        pow_limit_postfork: POW_LIMIT_MAIN,
        pow_averaging_window: 30,
        pow_max_adjust_up: 16,
        pow_max_adjust_down: 32,
        pow_target_timespan_legacy: 14 * 24 * 60 * 60,
        pow_target_spacing: 10 * 60,
        allow_min_difficulty: false,
        no_retargeting: false,
        equihash_n: 80,
        equihash_k: 4,
        rule_change_activation_threshold: 1512, // 75% for testchains
        miner_confirmation_window: 2016,
        deployments: [
            DeploymentParams { bit: 28, start_time: 1_199_145_601, timeout: 1_230_767_999 },
            DeploymentParams { bit: 0, start_time: 1_456_790_400, timeout: 1_493_596_800 },
            DeploymentParams { bit: 1, start_time: 1_462_060_800, timeout: 1_493_596_800 },
        ],
        magic: Magic::TESTNET,
        magic_legacy: Magic::TESTNET_LEGACY,
        default_port: 18331,
        bitcoin_default_port: 18333,
        base58_pubkey_prefix: 111,
        base58_script_prefix: 196,
        base58_secret_prefix: 239,
        ext_public_key_prefix: [0x04, 0x35, 0x87, 0xcf],
        ext_secret_key_prefix: [0x04, 0x35, 0x83, 0x94],
    } }

    /// Consensus parameters for the regression test network.
    pub fn regtest() -> Self { Self {
        network: Network::Regtest,
        subsidy_halving_interval: 150,
        bci_height: 0,
        bci_premine_window: 0,
        bci_coin_transfer_height: 850,
        bci_coin_transfer_amount: 1_851_040_046_271_426,
        bci_last_height_with_reward: 281_665,
        prog_fork_height: 0,
        bitcoin_postfork_block: BlockHash::from_byte_array([0; 32]),
        pow_limit_legacy: POW_LIMIT_REGTEST,
        pow_limit_start: POW_LIMIT_REGTEST,
        pow_limit_postfork: POW_LIMIT_REGTEST,
        pow_averaging_window: 30,
        pow_max_adjust_up: 32,
        pow_max_adjust_down: 16,
        pow_target_timespan_legacy: 14 * 24 * 60 * 60,
        pow_target_spacing: 10 * 60,
        allow_min_difficulty: true,
        no_retargeting: true,
        equihash_n: 48,
        equihash_k: 5,
        rule_change_activation_threshold: 108, // 75% of 144
        miner_confirmation_window: 144,
        deployments: [
            DeploymentParams { bit: 28, start_time: 0, timeout: 999_999_999_999 },
            DeploymentParams { bit: 0, start_time: 0, timeout: 999_999_999_999 },
            DeploymentParams { bit: 1, start_time: 0, timeout: 999_999_999_999 },
        ],
        magic: Magic::REGTEST,
        magic_legacy: Magic::REGTEST,
        default_port: 18444,
        bitcoin_default_port: 18444,
        base58_pubkey_prefix: 111,
        base58_script_prefix: 196,
        base58_secret_prefix: 239,
        ext_public_key_prefix: [0x04, 0x35, 0x87, 0xcf],
        ext_secret_key_prefix: [0x04, 0x35, 0x83, 0x94],
    } }

    pub fn for_network(network: Network) -> Self {
        let params = match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Regtest => Self::regtest(),
        };
        params.validate();
        params
    }

    /// Era-indexed upper target bound.
    pub fn pow_limit(&self, postfork: bool) -> Target {
        if postfork {
            self.pow_limit_postfork
        } else {
            self.pow_limit_legacy
        }
    }

    /// Blocks between legacy difficulty adjustments.
    pub fn difficulty_adjustment_interval(&self) -> u32 {
        (self.pow_target_timespan_legacy / self.pow_target_spacing) as u32
    }

    /// Ideal duration of one averaging window, seconds.
    pub fn averaging_window_timespan(&self) -> i64 {
        i64::from(self.pow_averaging_window) * self.pow_target_spacing as i64
    }

    /// Shortest window duration the retarget will credit.
    pub fn min_actual_timespan(&self) -> i64 {
        self.averaging_window_timespan() * (100 - i64::from(self.pow_max_adjust_up)) / 100
    }

    /// Longest window duration the retarget will credit.
    pub fn max_actual_timespan(&self) -> i64 {
        self.averaging_window_timespan() * (100 + i64::from(self.pow_max_adjust_down)) / 100
    }

    pub fn deployment(&self, deployment: Deployment) -> DeploymentParams {
        self.deployments[deployment as usize]
    }

    /// Construction invariants. Violations are corrupted parameter sets, not
    /// bad peer input, so they halt.
    fn validate(&self) {
        // Regtest's permissive limit cannot honor this bound; its windowed
        // sums wrap, matching the deployed arithmetic.
        if self.network != Network::Regtest {
            assert!(
                U256::MAX / self.pow_limit_postfork.as_u256()
                    >= U256::from(self.pow_averaging_window),
                "averaging-window target sum could overflow"
            );
        }
        assert_eq!(
            self.pow_target_timespan_legacy % self.pow_target_spacing,
            0,
            "legacy timespan must be a whole number of spacings"
        );
        assert!(
            self.prog_fork_height == 0
                || self.prog_fork_height >= self.bci_height + self.bci_premine_window,
            "fork heights must be non-decreasing"
        );
    }
}

static SELECTED: RwLock<Option<NetworkParams>> = RwLock::new(None);

/// Selects the process-wide network. Call once at startup, before any
/// consensus evaluation; re-selection is for test harnesses only.
pub fn select_params(network: Network) {
    let params = NetworkParams::for_network(network);
    *SELECTED.write().expect("params lock poisoned") = Some(params);
}

/// The selected network's parameters.
///
/// # Panics
///
/// If [`select_params`] has not been called.
pub fn selected_params() -> NetworkParams {
    SELECTED
        .read()
        .expect("params lock poisoned")
        .expect("network params not selected")
}

/// Overrides one deployment's schedule on the selected params. Regression
/// tests use this; it is the only permitted post-selection mutation.
pub fn update_deployment_params(deployment: Deployment, start_time: i64, timeout: i64) {
    let mut guard = SELECTED.write().expect("params lock poisoned");
    let params = guard.as_mut().expect("network params not selected");
    params.deployments[deployment as usize].start_time = start_time;
    params.deployments[deployment as usize].timeout = timeout;
}
