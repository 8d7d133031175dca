pub mod corpus_csv;
