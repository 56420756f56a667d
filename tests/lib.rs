// Test utilities module - shared across all test types
mod test_utils;

// Unit tests
mod unit;
