pub mod butterworth;
pub mod interp;
pub mod peak_finding;
pub mod savgol;
pub mod spectrum;
