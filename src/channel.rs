//! Parsing of multi-channel container channel names into view/component identities.
//!
//! Source containers name their channels with one of three shapes:
//!
//! | Name                  | Meaning                                   |
//! |-----------------------|-------------------------------------------|
//! | `R`, `G`, `B`         | a color component of the unnamed view     |
//! | `Z`                   | the depth plane of the unnamed view       |
//! | `Image.<view>.<R\|G\|B>` | a color component of the named view    |
//! | `Depth.<view>.V`      | the depth plane of the named view         |
//!
//! Anything else is not part of any view. The grammar is compiled here once into a tagged
//! [`ChannelId`] instead of being re-derived from string prefixes at every use site.

/// The name used for the unnamed legacy view.
pub const DEFAULT_VIEW: &str = "DEFAULT";

/// One of the three color components of a view.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Component {
    /// Red.
    R,
    /// Green.
    G,
    /// Blue.
    B,
}

impl Component {
    fn from_suffix(s: &str) -> Option<Component> {
        match s {
            "R" => Some(Component::R),
            "G" => Some(Component::G),
            "B" => Some(Component::B),
            _ => None,
        }
    }
}

/// The identity of one container channel, parsed from its name.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ChannelId {
    /// A color component of a named view (`Image.<view>.<R|G|B>`).
    Color {
        /// The view the channel belongs to.
        view: String,
        /// Which color component the channel carries.
        component: Component,
    },
    /// The depth plane of a named view (`Depth.<view>.V`).
    Depth {
        /// The view the channel belongs to.
        view: String,
    },
    /// A bare `R`/`G`/`B` channel of the unnamed view.
    LegacyColor(Component),
    /// A bare `Z` channel of the unnamed view.
    LegacyDepth,
}

impl ChannelId {
    /// Parse a channel name, returning `None` for names outside the grammar.
    ///
    /// View names must be non-empty; `Image..R` is not a view channel.
    pub fn parse(name: &str) -> Option<ChannelId> {
        match name {
            "R" => return Some(ChannelId::LegacyColor(Component::R)),
            "G" => return Some(ChannelId::LegacyColor(Component::G)),
            "B" => return Some(ChannelId::LegacyColor(Component::B)),
            "Z" => return Some(ChannelId::LegacyDepth),
            _ => {}
        }

        if let Some(rest) = name.strip_prefix("Image.") {
            let (view, suffix) = rest.rsplit_once('.')?;
            let component = Component::from_suffix(suffix)?;
            if view.is_empty() {
                return None;
            }
            return Some(ChannelId::Color {
                view: view.to_owned(),
                component,
            });
        }

        if let Some(rest) = name.strip_prefix("Depth.") {
            let view = rest.strip_suffix(".V")?;
            if view.is_empty() {
                return None;
            }
            return Some(ChannelId::Depth {
                view: view.to_owned(),
            });
        }

        None
    }

    /// The view this channel belongs to; legacy channels map to [`DEFAULT_VIEW`].
    pub fn view(&self) -> &str {
        match self {
            ChannelId::Color { view, .. } | ChannelId::Depth { view } => view,
            ChannelId::LegacyColor(_) | ChannelId::LegacyDepth => DEFAULT_VIEW,
        }
    }
}
