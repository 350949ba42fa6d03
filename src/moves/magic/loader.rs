use once_cell::sync::OnceCell;

use super::precompute::{MagicTableSeed, generate_magic_tables};
use super::structs::MagicTables;

#[cfg(feature = "deterministic_magic")]
const MAGIC_SEED: u64 = 0x45;

#[cfg(feature = "load_magic")]
const MAGIC_FILE: &str = "magic.bin";

fn table_seed() -> MagicTableSeed {
    #[cfg(feature = "deterministic_magic")]
    {
        MagicTableSeed::Fixed(MAGIC_SEED)
    }
    #[cfg(not(feature = "deterministic_magic"))]
    {
        MagicTableSeed::Random
    }
}

fn build_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    {
        if let Ok(bytes) = std::fs::read(MAGIC_FILE)
            && let Ok(tables) = bincode::deserialize::<MagicTables>(&bytes)
        {
            return tables;
        }
        let tables = generate_magic_tables(table_seed()).expect("magic table generation failed");
        if let Ok(bytes) = bincode::serialize(&tables) {
            let _ = std::fs::write(MAGIC_FILE, bytes);
        }
        tables
    }
    #[cfg(not(feature = "load_magic"))]
    {
        generate_magic_tables(table_seed()).expect("magic table generation failed")
    }
}

/// Load the sliding-attack tables. The expensive construction (or file load,
/// with the `load_magic` feature) happens once per process; later calls hand
/// out copies of the cached tables.
pub fn load_magic_tables() -> MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(build_tables).clone()
}
