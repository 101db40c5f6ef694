/// Knobs shared by every layer transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    /// Copy world transforms of matched leaves during modelling.
    pub update_transform: bool,

    /// Set when the materials layer runs in the same update, so modelling
    /// doesn't transfer surfacing only to have it replaced right after.
    pub replacing_materials: bool,
}

impl Default for TransferSettings {
    fn default() -> Self {
        TransferSettings {
            update_transform: true,
            replacing_materials: false,
        }
    }
}
