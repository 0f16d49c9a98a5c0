pub mod mock_volleynet;
