use num_traits::Float;


/// Arithmetic mean of `xs`. An empty slice gives NaN.
pub fn mean<T, I>(xs: I) -> T
where T: Float,
      I: AsRef<[T]>,
{
    let xs = xs.as_ref();
    if xs.is_empty() {
        return T::nan();
    }
    let len = T::from(xs.len()).unwrap_or_else(T::nan);
    xs.iter().fold(T::zero(), |acc, &x| acc + x) / len
}


/// Central moment of order `order`: `mean((x - mean(x)) ** order)`.
pub fn central_moment<T, I>(xs: I, order: i32) -> T
where T: Float,
      I: AsRef<[T]>,
{
    let xs = xs.as_ref();
    let mu = mean(xs);
    let shifted = xs.iter()
        .map(|&x| (x - mu).powi(order))
        .collect::<Vec<_>>();
    mean(shifted)
}


/// The first three moments used as a compact summary of a distribution:
/// `[mean, sqrt(2nd central moment), cbrt(3rd central moment)]`.
///
/// The cube root keeps the sign of the 3rd moment, so that skewness towards either side
/// stays distinguishable.
pub fn moment_triplet<T, I>(xs: I) -> [T; 3]
where T: Float,
      I: AsRef<[T]>,
{
    let xs = xs.as_ref();
    [
        mean(xs),
        central_moment(xs, 2).sqrt(),
        central_moment(xs, 3).cbrt(),
    ]
}
