mod codec;
mod concurrency;
mod invariant;
mod lifecycle;
