//! Fixed recommendation content served when the reasoning capability cannot be used.
//!
//! Kept as plain data so it can be versioned and asserted on directly.

use crate::models::PICK_COUNT;

/// A fixed book entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookSeed {
    pub title: &'static str,
    pub author: &'static str,
    pub reason: &'static str,
}

/// A fixed pick with its fixed alternate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickSeed {
    pub book: BookSeed,
    pub genres: &'static [&'static str],
    pub alt: BookSeed,
}

/// Literary fiction, science fiction, memoir
pub const FALLBACK_PICKS: [PickSeed; PICK_COUNT] = [
    PickSeed {
        book: BookSeed {
            title: "The Overstory",
            author: "Richard Powers",
            reason: "A sweeping literary novel that braids many lives into one story, rewarding readers who love rich, patient storytelling.",
        },
        genres: &["Literary Fiction"],
        alt: BookSeed {
            title: "A Gentleman in Moscow",
            author: "Amor Towles",
            reason: "Warm, elegant literary fiction about finding a whole world inside confined walls.",
        },
    },
    PickSeed {
        book: BookSeed {
            title: "Project Hail Mary",
            author: "Andy Weir",
            reason: "A propulsive science-fiction adventure built on real problem-solving and an unforgettable friendship.",
        },
        genres: &["Science Fiction", "Adventure"],
        alt: BookSeed {
            title: "The Left Hand of Darkness",
            author: "Ursula K. Le Guin",
            reason: "Classic science fiction whose world-building still reshapes how readers think about society.",
        },
    },
    PickSeed {
        book: BookSeed {
            title: "Educated",
            author: "Tara Westover",
            reason: "A compelling memoir about knowledge, family and self-invention.",
        },
        genres: &["Memoir", "Nonfiction"],
        alt: BookSeed {
            title: "Born a Crime",
            author: "Trevor Noah",
            reason: "A funny and moving memoir of growing up between worlds.",
        },
    },
];

/// Rotation for on-demand swaps; slot `n` starts its walk at entry `n`
pub const SWAP_ROTATION: [BookSeed; 6] = [
    BookSeed {
        title: "The Night Circus",
        author: "Erin Morgenstern",
        reason: "An enchanting, atmospheric novel for readers who like to get lost in a story.",
    },
    BookSeed {
        title: "The Martian",
        author: "Andy Weir",
        reason: "Gripping survival science fiction told with humour and technical wit.",
    },
    BookSeed {
        title: "21 Lessons for the 21st Century",
        author: "Yuval Noah Harari",
        reason: "Big-picture nonfiction that turns today's headlines into lasting questions.",
    },
    BookSeed {
        title: "Station Eleven",
        author: "Emily St. John Mandel",
        reason: "A luminous novel about what endures after collapse.",
    },
    BookSeed {
        title: "Klara and the Sun",
        author: "Kazuo Ishiguro",
        reason: "Quiet, thought-provoking fiction about love seen through artificial eyes.",
    },
    BookSeed {
        title: "H Is for Hawk",
        author: "Helen Macdonald",
        reason: "A memoir of grief and wildness that reads like a novel.",
    },
];

/// Source of deterministic fallback content
pub trait FallbackCatalog: Send + Sync {
    fn picks(&self) -> &[PickSeed; PICK_COUNT];

    fn swap_rotation(&self) -> &[BookSeed];
}

/// The built-in fallback content
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFallback;

impl FallbackCatalog for StaticFallback {
    fn picks(&self) -> &[PickSeed; PICK_COUNT] {
        &FALLBACK_PICKS
    }

    fn swap_rotation(&self) -> &[BookSeed] {
        &SWAP_ROTATION
    }
}
