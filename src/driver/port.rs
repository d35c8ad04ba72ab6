//! Port Controller
//!
//! A port is the peripheral-facing attachment point shared by one or more
//! channels. Its single control register combines burst lengths, endian
//! swap indices and, on newer revisions, packet drop on congestion.

#[cfg(feature = "log")]
use log::debug;

use crate::driver::capability::{BurstEncoding, BurstLen, Capabilities};
use crate::driver::config::PortConfig;
use crate::internal::register::port::{
    ENDIAN_MASK, LINEAR_BURST_MASK, LINEAR_RX_BURST_SHIFT, LINEAR_TX_BURST_SHIFT,
    ONEHOT_BURST8_FIELD, ONEHOT_RX_BURST_SHIFT, ONEHOT_RX_BURST16, ONEHOT_RX_BURST32,
    ONEHOT_TX_BURST_SHIFT, ONEHOT_TX_BURST16, ONEHOT_TX_BURST32, PORT_PKT_DROP,
    RX_ENDIAN_SHIFT, TX_ENDIAN_SHIFT,
};
use crate::internal::register::{DmaRegisters, RegisterBus};

/// Which side of the port a burst length applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Rx,
    Tx,
}

fn encode_burst(encoding: BurstEncoding, side: Side, burst: BurstLen) -> u32 {
    match encoding {
        BurstEncoding::Linear => {
            let field = match burst {
                BurstLen::Words8 => 0,
                BurstLen::Words16 => 1,
                BurstLen::Words32 => 2,
            };
            let shift = match side {
                Side::Rx => LINEAR_RX_BURST_SHIFT,
                Side::Tx => LINEAR_TX_BURST_SHIFT,
            };
            (field & LINEAR_BURST_MASK) << shift
        }
        BurstEncoding::OneHot => match (side, burst) {
            (Side::Rx, BurstLen::Words8) => ONEHOT_BURST8_FIELD << ONEHOT_RX_BURST_SHIFT,
            (Side::Rx, BurstLen::Words16) => ONEHOT_RX_BURST16,
            (Side::Rx, BurstLen::Words32) => ONEHOT_RX_BURST32,
            (Side::Tx, BurstLen::Words8) => ONEHOT_BURST8_FIELD << ONEHOT_TX_BURST_SHIFT,
            (Side::Tx, BurstLen::Words16) => ONEHOT_TX_BURST16,
            (Side::Tx, BurstLen::Words32) => ONEHOT_TX_BURST32,
        },
    }
}

/// Encode a port configuration as a `PORT_CTRL` value
#[must_use]
pub fn encode_port_ctrl(config: &PortConfig, caps: &Capabilities) -> u32 {
    let rx = config.rx_burst.unwrap_or(caps.default_burst);
    let tx = config.tx_burst.unwrap_or(caps.default_burst);

    let mut value = encode_burst(caps.burst_encoding, Side::Rx, rx)
        | encode_burst(caps.burst_encoding, Side::Tx, tx)
        | ((u32::from(config.rx_endian) & ENDIAN_MASK) << RX_ENDIAN_SHIFT)
        | ((u32::from(config.tx_endian) & ENDIAN_MASK) << TX_ENDIAN_SHIFT);
    if caps.packet_drop && config.drop_on_congestion {
        value |= PORT_PKT_DROP;
    }
    value
}

/// One physical port of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    index: u8,
    config: PortConfig,
}

impl Port {
    /// Create a port
    #[must_use]
    pub const fn new(index: u8, config: PortConfig) -> Self {
        Self { index, config }
    }

    /// Port index
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.index
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Replace the burst lengths; takes effect on the next `configure`
    pub fn set_bursts(&mut self, rx: BurstLen, tx: BurstLen) {
        self.config.rx_burst = Some(rx);
        self.config.tx_burst = Some(tx);
    }

    /// Select the port and write its control register
    ///
    /// Returns the value read back afterwards, for diagnostics only.
    pub fn configure<B: RegisterBus>(&self, regs: &DmaRegisters<B>, caps: &Capabilities) -> u32 {
        let value = encode_port_ctrl(&self.config, caps);
        let readback = regs.with_port(self.index, |w| {
            w.set_ctrl(value);
            w.ctrl()
        });
        #[cfg(feature = "log")]
        debug!("port {}: ctrl {:#010x} readback {:#010x}", self.index, value, readback);
        readback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::capability::{InstanceKind, Revision};
    use crate::testing::MockHardware;

    fn caps(revision: Revision) -> Capabilities {
        Capabilities::lookup(InstanceKind::Tx, revision)
    }

    #[test]
    fn linear_encoding_on_oldest_revision() {
        let c = caps(Revision::Gen1);
        let cfg = PortConfig::new().with_bursts(BurstLen::Words8, BurstLen::Words32);
        assert_eq!(encode_port_ctrl(&cfg, &c), 2 << 8);

        let cfg = PortConfig::new().with_bursts(BurstLen::Words16, BurstLen::Words16);
        assert_eq!(encode_port_ctrl(&cfg, &c), 1 | (1 << 8));
    }

    #[test]
    fn one_hot_encoding_on_newer_revisions() {
        let c = caps(Revision::Gen2);
        let cfg = PortConfig::new().with_bursts(BurstLen::Words32, BurstLen::Words16);
        assert_eq!(encode_port_ctrl(&cfg, &c), ONEHOT_RX_BURST32 | ONEHOT_TX_BURST16);

        let cfg = PortConfig::new().with_bursts(BurstLen::Words8, BurstLen::Words8);
        assert_eq!(encode_port_ctrl(&cfg, &c), 0x1 | (0x1 << 8));
    }

    #[test]
    fn default_burst_follows_revision() {
        let cfg = PortConfig::new();
        assert_eq!(encode_port_ctrl(&cfg, &caps(Revision::Gen1)), 1 | (1 << 8));
        assert_eq!(
            encode_port_ctrl(&cfg, &caps(Revision::Gen4)),
            ONEHOT_RX_BURST32 | ONEHOT_TX_BURST32
        );
    }

    #[test]
    fn packet_drop_gated_by_revision() {
        let cfg = PortConfig::new().with_drop_on_congestion(true);
        assert_eq!(encode_port_ctrl(&cfg, &caps(Revision::Gen2)) & PORT_PKT_DROP, 0);
        assert_ne!(encode_port_ctrl(&cfg, &caps(Revision::Gen3)) & PORT_PKT_DROP, 0);
    }

    #[test]
    fn endian_indices_packed() {
        let cfg = PortConfig::new()
            .with_bursts(BurstLen::Words16, BurstLen::Words16)
            .with_endian(5, 3);
        let value = encode_port_ctrl(&cfg, &caps(Revision::Gen4));
        assert_eq!((value >> RX_ENDIAN_SHIFT) & ENDIAN_MASK, 5);
        assert_eq!((value >> TX_ENDIAN_SHIFT) & ENDIAN_MASK, 3);
    }

    #[test]
    fn configure_selects_port_and_reads_back() {
        let hw = MockHardware::new();
        let regs = DmaRegisters::new(hw.clone());
        let c = caps(Revision::Gen4);
        let port = Port::new(2, PortConfig::new().with_endian(1, 1));

        let readback = port.configure(&regs, &c);
        assert_eq!(readback, encode_port_ctrl(port.config(), &c));
        assert_eq!(hw.port_reg(2), readback);
        assert_eq!(hw.port_reg(1), 0);
    }
}
