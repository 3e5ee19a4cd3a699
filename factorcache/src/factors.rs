use hashpool::{Error, Loader};

/// All prime factors of `n` in ascending order, with multiplicity.
/// `0` and `1` have no prime factors.
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    if n < 2 {
        return factors;
    }

    while n % 2 == 0 {
        factors.push(2);
        n /= 2;
    }

    let mut i: u64 = 3;
    while i * i <= n {
        while n % i == 0 {
            factors.push(i);
            n /= i;
        }
        i += 2;
    }

    // Whatever remains is a prime factor larger than sqrt of the original n.
    if n > 2 {
        factors.push(n);
    }

    factors
}

/// Cache loader: key is a decimal integer, value is its factor list as a
/// JSON array.
pub struct FactorLoader;

impl Loader for FactorLoader {
    fn load(&self, key: &str) -> Result<String, Error> {
        let n: u64 = key
            .parse()
            .map_err(|e| Error::Load(format!("invalid key {key:?}: {e}")))?;
        serde_json::to_string(&prime_factors(n)).map_err(|e| Error::Load(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_factors_of_composite() {
        assert_eq!(prime_factors(12), vec![2, 2, 3]);
        assert_eq!(prime_factors(360), vec![2, 2, 2, 3, 3, 5]);
    }

    #[test]
    fn test_prime_factors_of_prime() {
        assert_eq!(prime_factors(13), vec![13]);
        assert_eq!(prime_factors(2), vec![2]);
    }

    #[test]
    fn test_prime_factors_of_large_prime_remainder() {
        // 2 * 1_000_003, where 1_000_003 is prime
        assert_eq!(prime_factors(2_000_006), vec![2, 1_000_003]);
    }

    #[test]
    fn test_prime_factors_edge_cases() {
        assert!(prime_factors(0).is_empty());
        assert!(prime_factors(1).is_empty());
    }

    #[test]
    fn test_loader_renders_json_array() {
        let loader = FactorLoader;
        assert_eq!(loader.load("12").unwrap(), "[2,2,3]");
    }

    #[test]
    fn test_loader_rejects_non_numeric_key() {
        let loader = FactorLoader;
        assert!(loader.load("twelve").is_err());
    }
}
