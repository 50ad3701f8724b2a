//! Transport mode selection from command line flags.

use clap::Args;
use cost_surface::TransportMode;

#[derive(Args, Debug, Clone, Default)]
pub struct ModeFlags {
    /// Model car travel
    #[arg(long, conflicts_with = "no_car")]
    pub car: bool,

    /// Skip car travel even when configured
    #[arg(long)]
    pub no_car: bool,

    /// Model walking (anisotropic, requires elevation.tif)
    #[arg(long)]
    pub walk: bool,

    /// Model bicycle travel
    #[arg(long)]
    pub bike: bool,
}

impl ModeFlags {
    /// Apply the flags on top of the configured modes, in canonical order.
    pub fn resolve(&self, configured: &[TransportMode]) -> Vec<TransportMode> {
        TransportMode::ALL
            .into_iter()
            .filter(|mode| match mode {
                TransportMode::Car => !self.no_car && (self.car || configured.contains(mode)),
                TransportMode::Walk => self.walk || configured.contains(mode),
                TransportMode::Bike => self.bike || configured.contains(mode),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_modes_without_flags() {
        let flags = ModeFlags::default();
        assert_eq!(
            flags.resolve(&[TransportMode::Walk, TransportMode::Car]),
            vec![TransportMode::Car, TransportMode::Walk]
        );
    }

    #[test]
    fn test_flags_add_and_remove() {
        let flags = ModeFlags {
            no_car: true,
            walk: true,
            bike: true,
            ..Default::default()
        };
        assert_eq!(
            flags.resolve(&[TransportMode::Car]),
            vec![TransportMode::Walk, TransportMode::Bike]
        );
        assert!(ModeFlags { no_car: true, ..Default::default() }
            .resolve(&[TransportMode::Car])
            .is_empty());
    }
}
