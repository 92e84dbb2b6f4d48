//! Location codes and endpoint identity.
//!
//! A location is a `(region, zone, subzone)` triple. Each tier draws its code
//! from a small fixed set, so a code fits in a `u8` and a sibling chain in the
//! tree never holds more than [`MAX_CODES`] nodes.

use std::fmt;

use uuid::Uuid;

/// Number of distinct codes per tier.
pub const MAX_CODES: usize = 4;

macro_rules! location_code {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(test, derive(proptest_derive::Arbitrary))]
        #[repr(u8)]
        pub enum $name {
            $($variant = $code),+
        }

        impl $name {
            pub const ALL: [$name; MAX_CODES] = [$($name::$variant),+];

            #[inline]
            pub fn code(self) -> u8 {
                self as u8
            }

            #[inline]
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($name::$variant => f.write_str(stringify!($variant)),)+
                }
            }
        }
    };
}

location_code! {
    /// Broadest tier.
    Region { Asia = 0, Europe = 1, NorthAmerica = 2, SouthAmerica = 3 }
}

location_code! {
    Zone { Zone1 = 0, Zone2 = 1, Zone3 = 2, Zone4 = 3 }
}

location_code! {
    /// Narrowest tier; tree leaves live here.
    Subzone { Subzone1 = 0, Subzone2 = 1, Subzone3 = 2, Subzone4 = 3 }
}

/// One level of the hierarchy, broadest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Region,
    Zone,
    Subzone,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Region, Tier::Zone, Tier::Subzone];

    /// Depth in the forest: regions are roots at depth 0.
    #[inline]
    pub fn depth(self) -> usize {
        self as usize
    }

    /// Whether `code` names a location at this tier.
    #[inline]
    pub fn is_valid_code(self, code: u8) -> bool {
        match self {
            Tier::Region => Region::from_code(code).is_some(),
            Tier::Zone => Zone::from_code(code).is_some(),
            Tier::Subzone => Subzone::from_code(code).is_some(),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Region => "region",
            Tier::Zone => "zone",
            Tier::Subzone => "subzone",
        })
    }
}

/// Fully-qualified location. Ordering is component-wise, region first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct LocationKey {
    pub region: Region,
    pub zone: Zone,
    pub subzone: Subzone,
}

impl LocationKey {
    #[inline]
    pub const fn new(region: Region, zone: Zone, subzone: Subzone) -> Self {
        Self {
            region,
            zone,
            subzone,
        }
    }

    /// Codes in tier order.
    #[inline]
    pub fn codes(&self) -> [u8; 3] {
        [self.region.code(), self.zone.code(), self.subzone.code()]
    }

    #[inline]
    pub fn code_at(&self, tier: Tier) -> u8 {
        self.codes()[tier.depth()]
    }

    pub fn from_codes(codes: [u8; 3]) -> Option<Self> {
        Some(Self {
            region: Region::from_code(codes[0])?,
            zone: Zone::from_code(codes[1])?,
            subzone: Subzone::from_code(codes[2])?,
        })
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.region, self.zone, self.subzone)
    }
}

/// Globally unique endpoint identity.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct EndpointId(Uuid);

impl EndpointId {
    pub fn generate() -> EndpointId {
        EndpointId(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> EndpointId {
        EndpointId(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An addressable service instance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    id: EndpointId,
    name: Option<String>,
    location: LocationKey,
}

impl Endpoint {
    pub fn new(location: LocationKey) -> Self {
        Self {
            id: EndpointId::generate(),
            name: None,
            location,
        }
    }

    pub fn with_name(location: LocationKey, name: impl Into<String>) -> Self {
        Self {
            id: EndpointId::generate(),
            name: Some(name.into()),
            location,
        }
    }

    /// Build an endpoint around an identity the caller already owns.
    pub fn with_id(id: EndpointId, location: LocationKey, name: Option<String>) -> Self {
        Self { id, name, location }
    }

    #[inline]
    pub fn id(&self) -> EndpointId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn location(&self) -> LocationKey {
        self.location
    }
}
