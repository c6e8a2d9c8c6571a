//! Chunk icons and names of the pack layouts.

use swamp_raff::FourOctets;

use crate::constant::ConstantKind;

/* ─────────────────────────── Top-level chunks ─────────────────────────── */

/// 📦 pack identifier chunk.
pub const PACK_ICON: FourOctets = [0xF0, 0x9F, 0x93, 0xA6];
/// 📜 type information chunk.
pub const TYPE_INFO_ICON: FourOctets = [0xF0, 0x9F, 0x93, 0x9C];
/// Name of the type information chunk (both layouts).
pub const TYPE_INFO_NAME: FourOctets = *b"sti0";
/// 💻 code chunk (spk4).
pub const CODE_ICON: FourOctets = [0xF0, 0x9F, 0x92, 0xBB];
/// Name of the code chunk (spk4).
pub const CODE_NAME: FourOctets = *b"scd0";
/// 💾 constant memory chunk (spk5).
pub const CONSTANT_MEMORY_ICON: FourOctets = [0xF0, 0x9F, 0x92, 0xBE];
/// Name of the constant memory chunk (spk5).
pub const CONSTANT_MEMORY_NAME: FourOctets = *b"dme1";
/// 📒 ledger chunk (spk5).
pub const LEDGER_ICON: FourOctets = [0xF0, 0x9F, 0x93, 0x92];
/// Name of the ledger chunk (spk5).
pub const LEDGER_NAME: FourOctets = *b"ldg0";

/* ─────────────────────────── Internal code sections ─────────────────────────── */

/// 👾
pub const EXTERNAL_FUNCTION_ICON: FourOctets = [0xF0, 0x9F, 0x91, 0xBE];
/// 🛂
pub const FUNCTION_DECLARATION_ICON: FourOctets = [0xF0, 0x9F, 0x9B, 0x82];
/// 🐜
pub const BOOLEAN_ICON: FourOctets = [0xF0, 0x9F, 0x90, 0x9C];
/// 🔢
pub const INTEGER_ICON: FourOctets = [0xF0, 0x9F, 0x94, 0xA2];
/// 🎻
pub const STRING_ICON: FourOctets = [0xF0, 0x9F, 0x8E, 0xBB];
/// 🌳
pub const RESOURCE_NAME_ICON: FourOctets = [0xF0, 0x9F, 0x8C, 0xB3];
/// 🐊
pub const FUNCTION_ICON: FourOctets = [0xF0, 0x9F, 0x90, 0x8A];

impl ConstantKind {
    /// Internal chunk marker opening this kind's section.
    pub const fn icon(self) -> FourOctets {
        match self {
            Self::ExternalFunction => EXTERNAL_FUNCTION_ICON,
            Self::FunctionDeclaration => FUNCTION_DECLARATION_ICON,
            Self::Boolean => BOOLEAN_ICON,
            Self::Integer => INTEGER_ICON,
            Self::String => STRING_ICON,
            Self::ResourceName => RESOURCE_NAME_ICON,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_are_the_documented_emoji() {
        let rendered: Vec<String> = ConstantKind::WRITE_ORDER
            .iter()
            .map(|k| swamp_raff::describe(&k.icon()))
            .chain([swamp_raff::describe(&FUNCTION_ICON)])
            .collect();
        assert_eq!(rendered, ["👾", "🛂", "🐜", "🔢", "🎻", "🌳", "🐊"]);
        assert_eq!(swamp_raff::describe(&CODE_ICON), "💻");
        assert_eq!(swamp_raff::describe(&CONSTANT_MEMORY_ICON), "💾");
        assert_eq!(swamp_raff::describe(&LEDGER_ICON), "📒");
    }
}
