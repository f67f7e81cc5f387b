//! Static translation of WMO weather codes into display labels.

/// Label used for any code missing from the table.
pub const UNDEFINED_LABEL: &str = "Tempo indefinido";

static WEATHER_CODES: &[(i32, &str)] = &[
    (0, "Céu limpo ☀️"),
    (1, "Principalmente limpo 🌤️"),
    (2, "Parcialmente nublado ⛅"),
    (3, "Nublado ☁️"),
    (45, "Nevoeiro 🌫️"),
    (48, "Nevoeiro com gelo 🌫️"),
    (51, "Garoa fraca 🌦️"),
    (61, "Chuva fraca 🌧️"),
    (80, "Pancadas de chuva 🌧️"),
    (95, "Tempestade ⛈️"),
];

/// Human-readable condition for a weather code.
pub fn condition_label(code: i32) -> &'static str {
    WEATHER_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
        .unwrap_or(UNDEFINED_LABEL)
}

/// Codes that have a dedicated label.
pub fn known_codes() -> impl Iterator<Item = i32> {
    WEATHER_CODES.iter().map(|(code, _)| *code)
}
