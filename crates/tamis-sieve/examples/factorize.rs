//! Factorise numbers using only the `PrimeTable` query surface.
//!
//! ```text
//! RUST_LOG=tamis_sieve=debug cargo run --release -p tamis-sieve --example factorize -- 360 9999991 600851475143
//! ```

use tamis_sieve::{PrimeTable, Sieve, SieveConfig, SieveError};
use tracing_subscriber::EnvFilter;

/// Prime factorisation with multiplicity, smallest factor first.
fn factorize<T: PrimeTable>(table: &T, mut n: u64) -> Result<Vec<(u64, u32)>, SieveError> {
    let mut factors = Vec::new();
    if n < 2 {
        return Ok(factors);
    }
    let limit = n.isqrt().min(table.ceiling() - 1) + 1;
    for p in table.enumerate(limit)? {
        let p = u64::from(p?);
        if p * p > n {
            break;
        }
        let mut exponent = 0;
        while n % p == 0 {
            n /= p;
            exponent += 1;
        }
        if exponent > 0 {
            factors.push((p, exponent));
        }
    }
    if n > 1 {
        if !table.is_prime(n)? {
            return Err(SieveError::BeyondTrialDivision {
                value: n,
                ceiling: table.ceiling(),
            });
        }
        factors.push((n, 1));
    }
    Ok(factors)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn render(factors: &[(u64, u32)]) -> String {
    factors
        .iter()
        .map(|&(p, e)| if e == 1 { p.to_string() } else { format!("{p}^{e}") })
        .collect::<Vec<_>>()
        .join(" × ")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let inputs: Vec<u64> = std::env::args()
        .skip(1)
        .map(|a| a.parse())
        .collect::<Result<_, _>>()?;
    let inputs = if inputs.is_empty() {
        vec![360, 9_999_991, 600_851_475_143]
    } else {
        inputs
    };

    // 2^24 is plenty for inputs below 2^48; use the default for larger ones.
    let config = if inputs.iter().all(|&n| n < 1 << 48) {
        SieveConfig::with_ceiling(1 << 24, 1 << 20)
    } else {
        SieveConfig::default()
    };
    let sieve = Sieve::new(config)?;

    for &n in &inputs {
        let factors = factorize(&sieve, n)?;
        println!("{n} = {}", render(&factors));
    }
    if let [a, b, ..] = inputs[..] {
        let g = gcd(a, b);
        if let Some(lcm) = (a / g.max(1)).checked_mul(b) {
            println!("gcd({a}, {b}) = {g}, lcm = {lcm}");
        }
    }

    let m = sieve.metrics();
    tracing::info!(
        boundary = m.boundary,
        segments = m.segments_sieved,
        state = %m.state,
        "done"
    );
    Ok(())
}
