//! Two-decimal rendering shared by every panel.

pub fn amount(value: f64) -> String {
    format!("{value:.2}")
}

pub fn multiplier(value: f64) -> String {
    format!("{value:.2}x")
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn multiplier__rounds_to_two_decimals_with_suffix() {
        assert_eq!(multiplier(1.874), "1.87x");
        assert_eq!(multiplier(2.0), "2.00x");
    }

    #[test]
    fn amount__pads_whole_numbers() {
        assert_eq!(amount(90.0), "90.00");
        assert_eq!(amount(0.5), "0.50");
    }
}
