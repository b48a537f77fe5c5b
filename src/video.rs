pub mod drm;
pub mod gem;

pub type Modifier = u64;

pub const LINEAR_MODIFIER: Modifier = 0;
pub const INVALID_MODIFIER: Modifier = 0x00ff_ffff_ffff_ffff;

const DRM_FORMAT_MOD_VENDOR_BROADCOM: u64 = 0x07;

const fn fourcc_mod_code(vendor: u64, val: u64) -> Modifier {
    (vendor << 56) | (val & 0x00ff_ffff_ffff_ffff)
}

pub const BROADCOM_VC4_T_TILED_MODIFIER: Modifier =
    fourcc_mod_code(DRM_FORMAT_MOD_VENDOR_BROADCOM, 1);

/// Returns the first modifier in `order` that is also contained in `candidates`.
pub fn pick_modifier(candidates: &[Modifier], order: &[Modifier]) -> Option<Modifier> {
    order.iter().copied().find(|m| candidates.contains(m))
}

pub fn modifier_name(modifier: Modifier) -> Option<&'static str> {
    let name = match modifier {
        LINEAR_MODIFIER => "linear",
        BROADCOM_VC4_T_TILED_MODIFIER => "vc4-t-tiled",
        INVALID_MODIFIER => "invalid",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use crate::video::{
        BROADCOM_VC4_T_TILED_MODIFIER, INVALID_MODIFIER, LINEAR_MODIFIER, pick_modifier,
    };

    #[test]
    fn t_tiled_value() {
        assert_eq!(BROADCOM_VC4_T_TILED_MODIFIER, 0x0700_0000_0000_0001);
    }

    #[test]
    fn pick_follows_order() {
        let order = [BROADCOM_VC4_T_TILED_MODIFIER, LINEAR_MODIFIER];
        let both = [LINEAR_MODIFIER, BROADCOM_VC4_T_TILED_MODIFIER];
        assert_eq!(
            pick_modifier(&both, &order),
            Some(BROADCOM_VC4_T_TILED_MODIFIER)
        );
        assert_eq!(pick_modifier(&[LINEAR_MODIFIER], &order), Some(LINEAR_MODIFIER));
        assert_eq!(pick_modifier(&[INVALID_MODIFIER], &order), None);
        assert_eq!(pick_modifier(&[], &order), None);
    }
}
