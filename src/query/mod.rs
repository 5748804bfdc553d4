pub mod pallet;

pub use pallet::{ForwardLink, LinkPallet, TwoHopGroup, assemble_pallet, link_pallet};
