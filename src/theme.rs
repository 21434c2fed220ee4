// Board themes. The registry is seeded with built-in themes and only grows through `register`.
// Boards never look at the registry directly: they get a `ThemeResolver`.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::surface::Color;


pub const DEFAULT_THEME: &str = "brown";

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub light_square: Color,
    pub dark_square: Color,
    pub last_move: Color,
    pub selection: Color,
    pub legal_move: Color,
    pub premove: Color,
    pub hover: Color,
}

pub trait ThemeResolver {
    fn resolve(&self, name: &str) -> Option<Theme>;
}

#[derive(Clone, Debug)]
pub struct ThemeRegistry {
    themes: BTreeMap<String, Theme>,
}

impl ThemeRegistry {
    pub fn with_builtin_themes() -> Self {
        let mut registry = ThemeRegistry { themes: BTreeMap::new() };
        for theme in builtin_themes() {
            registry.register(theme);
        }
        registry
    }

    // Replaces a theme with the same name, if any.
    pub fn register(&mut self, theme: Theme) { self.themes.insert(theme.name.clone(), theme); }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.themes.keys().map(String::as_str) }
}

impl ThemeResolver for ThemeRegistry {
    fn resolve(&self, name: &str) -> Option<Theme> { self.themes.get(name).cloned() }
}

// Allows registering themes after the registry has been handed out to boards.
impl ThemeResolver for RefCell<ThemeRegistry> {
    fn resolve(&self, name: &str) -> Option<Theme> { self.borrow().resolve(name) }
}

fn builtin_themes() -> Vec<Theme> {
    let common = |name: &str, light_square: Color, dark_square: Color| Theme {
        name: name.to_owned(),
        light_square,
        dark_square,
        last_move: Color::rgb(0xcd, 0xd2, 0x6a),
        selection: Color::rgb(0x14, 0x55, 0x1e),
        legal_move: Color::rgb(0x14, 0x55, 0x1e),
        premove: Color::rgb(0x14, 0x1e, 0x55),
        hover: Color::rgb(0xff, 0xff, 0xff),
    };
    vec![
        common(DEFAULT_THEME, Color::rgb(0xf0, 0xd9, 0xb5), Color::rgb(0xb5, 0x88, 0x63)),
        common("green", Color::rgb(0xee, 0xee, 0xd2), Color::rgb(0x76, 0x96, 0x56)),
        common("blue", Color::rgb(0xde, 0xe3, 0xe6), Color::rgb(0x8c, 0xa2, 0xad)),
        Theme {
            last_move: Color::rgb(0xaa, 0xa2, 0x3a),
            ..common("dark", Color::rgb(0x77, 0x77, 0x77), Color::rgb(0x44, 0x44, 0x44))
        },
    ]
}
