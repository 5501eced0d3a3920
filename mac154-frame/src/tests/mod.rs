mod parsing;
mod roundtrip;
