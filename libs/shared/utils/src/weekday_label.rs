use shared_models::Weekday;

/// Brazilian Portuguese weekday names for API responses. Presentation only;
/// nothing in the scheduling engine depends on these strings.
pub fn pt_br(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Segunda-feira",
        Weekday::Tuesday => "Terça-feira",
        Weekday::Wednesday => "Quarta-feira",
        Weekday::Thursday => "Quinta-feira",
        Weekday::Friday => "Sexta-feira",
        Weekday::Saturday => "Sábado",
        Weekday::Sunday => "Domingo",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_every_weekday() {
        assert_eq!(pt_br(Weekday::Monday), "Segunda-feira");
        assert_eq!(pt_br(Weekday::Sunday), "Domingo");
    }
}
