//! Serializers for chess values in the shapes the web client expects.

pub mod position_serde {
    use serde::Serializer;
    use shakmaty::{fen::Fen, Chess};

    pub fn serialize<S: Serializer>(b: &Chess, ser: S) -> Result<S::Ok, S::Error> {
        let fen = Fen::from_position(b.clone(), shakmaty::EnPassantMode::Legal);
        ser.serialize_str(&fen.to_string())
    }
}

pub mod uci_serde {
    use serde::Serializer;
    use shakmaty::uci::Uci;

    pub fn serialize<S: Serializer>(u: &Uci, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&u.to_string())
    }
}

/// A principal variation as a single space-separated UCI string.
pub mod pv_serde {
    use serde::Serializer;
    use shakmaty::uci::Uci;

    pub fn serialize<S: Serializer>(pv: &[Uci], ser: S) -> Result<S::Ok, S::Error> {
        let line = pv
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        ser.serialize_str(&line)
    }
}

/// Elapsed search time in (fractional) seconds.
pub mod seconds_serde {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_f64(d.as_secs_f64())
    }
}
