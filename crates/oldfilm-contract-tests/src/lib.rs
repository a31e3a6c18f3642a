#![forbid(unsafe_code)]

#[cfg(test)]
mod render_contract;
