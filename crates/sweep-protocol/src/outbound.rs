use serde::Serialize;
use sweep_geom::Coordinate;

/// Events reported to the authority. Coordinates travel as decimal strings
/// because no JSON number type can hold them exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Outbound {
    Camera { x: String, y: String },
    Resize { width: u32, height: u32 },
    Reveal { x: String, y: String },
    Flag { x: String, y: String },
}

impl Outbound {
    pub fn camera(position: &Coordinate) -> Self {
        let (x, y) = position.to_decimal();
        Outbound::Camera { x, y }
    }

    pub fn reveal(tile: &Coordinate) -> Self {
        let (x, y) = tile.to_decimal();
        Outbound::Reveal { x, y }
    }

    pub fn flag(tile: &Coordinate) -> Self {
        let (x, y) = tile.to_decimal();
        Outbound::Flag { x, y }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Outbound::Camera { .. } => "camera",
            Outbound::Resize { .. } => "resize",
            Outbound::Reveal { .. } => "reveal",
            Outbound::Flag { .. } => "flag",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_encodes_decimal_strings() {
        let msg = Outbound::camera(&Coordinate::new(-12, 40));
        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"event":"camera","x":"-12","y":"40"}"#
        );
    }

    #[test]
    fn resize_keeps_numbers() {
        let msg = Outbound::Resize {
            width: 800,
            height: 600,
        };
        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"event":"resize","width":800,"height":600}"#
        );
    }

    #[test]
    fn flag_and_reveal_names() {
        let c = Coordinate::new(1, 2);
        assert_eq!(Outbound::flag(&c).name(), "flag");
        assert_eq!(Outbound::reveal(&c).name(), "reveal");
    }
}
