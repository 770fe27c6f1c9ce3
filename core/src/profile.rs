//! Display profiles for generated entities: names and avatar references.
//!
//! The generator treats this as an opaque random-data source. Swap in any
//! `ProfileSource` to change where names and avatars come from.

use crate::rng::RandomSource;

/// Opaque source of display attributes.
pub trait ProfileSource {
    fn full_name(&mut self, rng: &mut dyn RandomSource) -> String;
    fn avatar_ref(&mut self, rng: &mut dyn RandomSource) -> String;
}

/// Highest GitHub user number handed out for avatar refs.
const AVATAR_ID_CEILING: u32 = 99_999;

/// Curated name lists, GitHub-style avatar URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct CuratedProfiles;

impl CuratedProfiles {
    fn given_names() -> &'static [&'static str] {
        &[
            "Adi", "Agus", "Andi", "Arif", "Bayu", "Budi", "Dedi", "Dimas",
            "Eko", "Fajar", "Gilang", "Hendra", "Ilham", "Joko", "Krisna", "Lukman",
            "Made", "Nugroho", "Putra", "Rizky", "Slamet", "Teguh", "Wahyu", "Yusuf",
            "Ayu", "Citra", "Dewi", "Endah", "Fitri", "Gita", "Indah", "Kartika",
            "Lestari", "Maya", "Nadia", "Putri", "Ratna", "Sari", "Tari", "Wulan",
            "Amelia", "Daniel", "Grace", "Kevin", "Michael", "Olivia", "Sarah", "Yosef",
        ]
    }

    fn family_names() -> &'static [&'static str] {
        &[
            "Santoso", "Wijaya", "Saputra", "Hidayat", "Kusuma", "Pratama", "Setiawan",
            "Gunawan", "Halim", "Hartono", "Irawan", "Kurniawan", "Lubis", "Nasution",
            "Purnomo", "Rahman", "Siregar", "Simanjuntak", "Sitompul", "Susanto",
            "Tanoto", "Utomo", "Wibowo", "Yulianto", "Firmansyah", "Hakim", "Permana",
            "Ramadhan", "Salim", "Tambunan",
        ]
    }
}

impl ProfileSource for CuratedProfiles {
    fn full_name(&mut self, rng: &mut dyn RandomSource) -> String {
        let given = Self::given_names();
        let family = Self::family_names();
        let first = given[rng.pick_index(given.len())];
        let last = family[rng.pick_index(family.len())];
        format!("{first} {last}")
    }

    fn avatar_ref(&mut self, rng: &mut dyn RandomSource) -> String {
        let user = rng.int_in_range(1, AVATAR_ID_CEILING);
        format!("https://avatars.githubusercontent.com/u/{user}")
    }
}
