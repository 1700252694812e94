/// Trailing simple moving average over `window` observations.
///
/// The output is aligned with `data`; the first `window - 1` values are NaN.
/// A zero window, or one longer than the data, yields all NaN.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    let mut sma = vec![f64::NAN; data.len()];
    if window == 0 || window > data.len() {
        return sma;
    }

    let w = window as f64;
    let mut sum: f64 = data[..window].iter().sum();
    sma[window - 1] = sum / w;

    for i in window..data.len() {
        sum += data[i] - data[i - window];
        sma[i] = sum / w;
    }

    sma
}

/// Number of leading NaN entries `moving_average` produces for `window`.
pub fn warmup(window: usize) -> usize {
    window.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = moving_average(&data, 3);

        assert_eq!(sma.len(), 5);
        assert!(sma[0].is_nan());
        assert!(sma[1].is_nan());
        assert!((sma[2] - 2.0).abs() < 1e-10);
        assert!((sma[3] - 3.0).abs() < 1e-10);
        assert!((sma[4] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let data = vec![3.0, 1.0, 4.0];
        assert_eq!(moving_average(&data, 1), data);
    }

    #[test]
    fn test_window_equal_to_length() {
        let sma = moving_average(&[2.0, 4.0, 6.0], 3);
        assert!(sma[1].is_nan());
        assert!((sma[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_windows() {
        let data = vec![1.0, 2.0];
        assert!(moving_average(&data, 3).iter().all(|v| v.is_nan()));
        assert!(moving_average(&data, 0).iter().all(|v| v.is_nan()));
        assert_eq!(warmup(0), 0);
        assert_eq!(warmup(20), 19);
    }
}
