//! Static field tables. A field's bit index is its position in the list, so
//! these lists are append-only: reordering or removing an entry changes the
//! meaning of every stored mask.

use crate::bitmask::Bitmask;

pub type GroupTable = &'static [(&'static str, &'static [&'static str])];

pub const GAME_FIELDS: &[&str] = &[
    "vndb_id",
    "steam_id",
    "dlsite_id",
    "egs_id",
    "bangumi_id",
    "title_jp",
    "title_en",
    "title_zh",
    "aliases",
    "intro_jp",
    "intro_en",
    "intro_zh",
    "release_date",
    "release_date_tba",
    "cover_image",
    "images",
    "official_website",
    "links",
    "covers",
    "screenshots",
    "developers",
    "characters",
    "tags",
    "platforms",
    "staffs",
    "nsfw",
    "type",
];

pub const GAME_GROUPS: GroupTable = &[
    ("IDS", &["vndb_id", "steam_id", "dlsite_id", "egs_id", "bangumi_id"]),
    ("TITLES", &["title_jp", "title_en", "title_zh", "aliases"]),
    ("INTRO", &["intro_jp", "intro_en", "intro_zh"]),
    ("DATES", &["release_date", "release_date_tba"]),
    ("IMAGE", &["cover_image", "images"]),
    ("WEBSITE", &["official_website", "links"]),
    ("COVERS", &["covers"]),
    ("SCREENSHOTS", &["screenshots"]),
    ("DEVELOPERS", &["developers"]),
    ("CHARACTERS", &["characters"]),
    ("TAGS", &["tags"]),
    ("PLATFORMS", &["platforms"]),
    ("STAFFS", &["staffs"]),
    ("META", &["nsfw", "type"]),
];

pub const DEVELOPER_FIELDS: &[&str] = &[
    "vndb_id",
    "bangumi_id",
    "name",
    "aliases",
    "intro_jp",
    "intro_en",
    "intro_zh",
    "logo",
    "website",
    "links",
    "country",
    "founded_date",
    "type",
    "games",
];

pub const DEVELOPER_GROUPS: GroupTable = &[
    ("IDS", &["vndb_id", "bangumi_id"]),
    ("NAMES", &["name", "aliases"]),
    ("INTRO", &["intro_jp", "intro_en", "intro_zh"]),
    ("IMAGE", &["logo"]),
    ("WEBSITE", &["website", "links"]),
    ("DETAILS", &["country", "founded_date", "type"]),
    ("GAMES", &["games"]),
];

pub const CHARACTER_FIELDS: &[&str] = &[
    "vndb_id",
    "bangumi_id",
    "name_jp",
    "name_en",
    "name_zh",
    "aliases",
    "intro_jp",
    "intro_en",
    "intro_zh",
    "image",
    "images",
    "gender",
    "birthday",
    "blood_type",
    "height",
    "weight",
    "bust",
    "waist",
    "hips",
    "age",
    "games",
    "voice_actors",
];

pub const CHARACTER_GROUPS: GroupTable = &[
    ("IDS", &["vndb_id", "bangumi_id"]),
    ("NAMES", &["name_jp", "name_en", "name_zh", "aliases"]),
    ("INTRO", &["intro_jp", "intro_en", "intro_zh"]),
    ("IMAGE", &["image", "images"]),
    (
        "PROFILE",
        &[
            "gender",
            "birthday",
            "blood_type",
            "height",
            "weight",
            "bust",
            "waist",
            "hips",
            "age",
        ],
    ),
    ("GAMES", &["games"]),
    ("VOICES", &["voice_actors"]),
];

const _: () = assert!(GAME_FIELDS.len() <= Bitmask::BITS as usize);
const _: () = assert!(DEVELOPER_FIELDS.len() <= Bitmask::BITS as usize);
const _: () = assert!(CHARACTER_FIELDS.len() <= Bitmask::BITS as usize);
